//! Switch lowering.
//!
//! ```text
//! switch v {            let selector = v
//!     1: A              if selector == 1 { A }
//!     2: B              else { if selector == 2 { B }
//!     default: C               else { C } }
//! }
//! ```
//!
//! The value is evaluated once. Arms are tested in order, the first arm
//! outermost.

use std::mem;
use std::rc::Rc;

use slang_ir::build::Builder;
use slang_ir::visitor::{walk_statement, VisitorMut};
use slang_ir::{BinaryOp, Definition, Module, Statement, StatementKind, SwitchArm};
use tracing::debug;

use crate::context::LoweringContext;

pub(crate) fn lower_switches(module: &mut Module, cx: &LoweringContext<'_>) {
    let mut lowering = SwitchLowering {
        b: Builder::new(cx.ids),
        switches: 0,
    };
    for definition in &module.definitions {
        lowering.visit_definition(definition);
    }
    debug!(module = %module.name(), switches = lowering.switches, "lowered switches");
}

struct SwitchLowering<'a> {
    b: Builder<'a>,
    switches: usize,
}

impl VisitorMut for SwitchLowering<'_> {
    fn visit_statement(&mut self, statement: &mut Statement) {
        walk_statement(self, statement);
        let StatementKind::Switch {
            value,
            arms,
            default,
        } = &mut statement.kind
        else {
            return;
        };
        let b = self.b.located(statement.location);
        let selector = b.variable("selector");
        let capture = b.let_(&selector, None, mem::take(value));
        let chain = mem::take(arms).into_iter().rev().fold(
            mem::take(&mut **default),
            |otherwise, SwitchArm { value, location, body }| {
                let b = b.located(location);
                let test = b.binop(
                    BinaryOp::Eq,
                    b.reference(Definition::Variable(Rc::clone(&selector))),
                    b.int(value),
                );
                b.if_(test, body, Some(otherwise))
            },
        );
        statement.kind = StatementKind::Compound(vec![capture, chain]);
        self.switches += 1;
    }
}
