//! Loop lowering.
//!
//! ```text
//! loop { B }                      while true { B }
//!
//! for v in a { B }                let iter = a
//!   (a: T[N])                     let index = 0
//!                                 while index < N {
//!                                     let v = iter[index]
//!                                     index = index + 1
//!                                     B
//!                                 }
//!
//! for v in s { B }                let it = s.iter()
//!   (iter/next protocol)          while true {
//!                                     let next = it.next()
//!                                     case next { None: break  Some(v): B }
//!                                 }
//!
//! for v in s { B }                let seq = s
//!   (len/get protocol)            let len = seq.len()
//!                                 let index = 0
//!                                 while index < len {
//!                                     let v = seq.get(index)
//!                                     index = index + 1
//!                                     B
//!                                 }
//! ```
//!
//! Counters advance before the body, so `continue` in `B` cannot skip the
//! increment. The phase also turns indexing of `get` receivers into `get`
//! calls and string conversions into runtime or `to_string()` calls.

use std::mem;
use std::rc::Rc;

use slang_diagnostic::{DiagnosticSink, Diagnostics, ErrorCode};
use slang_ir::build::Builder;
use slang_ir::defs::Variable;
use slang_ir::visitor::{walk_expression, walk_statement, VisitorMut};
use slang_ir::{
    BinaryOp, Definition, Expression, ExpressionKind, Iteration, Location, Module, Statement,
    StatementKind,
};
use slang_types::query;
use tracing::debug;

use crate::context::LoweringContext;
use crate::runtime::Runtime;

pub(crate) fn lower_loops(
    module: &mut Module,
    cx: &LoweringContext<'_>,
) -> Result<(), Diagnostics> {
    let mut lowering = LoopLowering {
        b: Builder::new(cx.ids),
        runtime: &cx.runtime,
        sink: DiagnosticSink::new(module.name()),
        loops: 0,
    };
    for definition in &module.definitions {
        lowering.visit_definition(definition);
    }
    debug!(module = %module.name(), loops = lowering.loops, "lowered loops");
    lowering.sink.finish()
}

struct LoopLowering<'a> {
    b: Builder<'a>,
    runtime: &'a Runtime,
    sink: DiagnosticSink,
    loops: usize,
}

fn var(variable: &Rc<Variable>) -> Definition {
    Definition::Variable(Rc::clone(variable))
}

impl LoopLowering<'_> {
    fn at(&self, location: Location) -> &Builder<'_> {
        self.b.located(location)
    }

    /// `index = index + 1`
    fn advance(&self, index: &Rc<Variable>, location: Location) -> Statement {
        let b = self.at(location);
        b.assign(
            b.reference(var(index)),
            b.binop(BinaryOp::Add, b.reference(var(index)), b.int(1)),
        )
    }

    fn array_loop(
        &self,
        variable: &Rc<Variable>,
        source: Expression,
        body: Statement,
        size: usize,
        location: Location,
    ) -> StatementKind {
        let b = self.at(location);
        let iter = b.variable("iter");
        let index = b.variable("index");
        let size = i64::try_from(size).unwrap_or(i64::MAX);
        let element = b.let_(
            variable,
            None,
            b.index(b.reference(var(&iter)), vec![b.reference(var(&index))]),
        );
        let step = b.compound(vec![element, self.advance(&index, location), body]);
        StatementKind::Compound(vec![
            b.let_(&iter, None, source),
            b.let_(&index, None, b.int(0)),
            b.while_(
                b.binop(BinaryOp::Lt, b.reference(var(&index)), b.int(size)),
                step,
            ),
        ])
    }

    fn iterator_loop(
        &self,
        variable: &Rc<Variable>,
        source: Expression,
        body: Statement,
        location: Location,
    ) -> StatementKind {
        let b = self.at(location);
        let it = b.variable("it");
        let next = b.variable("next");
        let arms = vec![
            b.arm("None", &[], b.break_()),
            b.arm("Some", &[Rc::clone(variable)], body),
        ];
        let step = b.compound(vec![
            b.let_(&next, None, b.call(b.attr(b.reference(var(&it)), "next"), vec![])),
            b.case(b.reference(var(&next)), arms, None),
        ]);
        StatementKind::Compound(vec![
            b.let_(&it, None, b.call(b.attr(source, "iter"), vec![])),
            b.while_(b.bool_(true), step),
        ])
    }

    fn sequence_loop(
        &self,
        variable: &Rc<Variable>,
        source: Expression,
        body: Statement,
        location: Location,
    ) -> StatementKind {
        let b = self.at(location);
        let seq = b.variable("seq");
        let len = b.variable("len");
        let index = b.variable("index");
        let element = b.let_(
            variable,
            None,
            b.call(
                b.attr(b.reference(var(&seq)), "get"),
                vec![b.arg(b.reference(var(&index)))],
            ),
        );
        let step = b.compound(vec![element, self.advance(&index, location), body]);
        StatementKind::Compound(vec![
            b.let_(&seq, None, source),
            b.let_(&len, None, b.call(b.attr(b.reference(var(&seq)), "len"), vec![])),
            b.let_(&index, None, b.int(0)),
            b.while_(
                b.binop(BinaryOp::Lt, b.reference(var(&index)), b.reference(var(&len))),
                step,
            ),
        ])
    }

    /// Conversion of `value` to `str`.
    fn to_string(&self, value: Expression, location: Location) -> ExpressionKind {
        let b = self.at(location);
        let ty = value.ty.clone();
        if ty.is_str() {
            return value.kind;
        }
        let builtin = if ty.is_int() {
            Some(&self.runtime.int_to_str)
        } else if ty.is_char() {
            Some(&self.runtime.char_to_str)
        } else {
            None
        };
        let (callee, args) = match builtin {
            Some(builtin) => (
                b.reference(Definition::ExternFunction(Rc::clone(builtin))),
                vec![b.arg(value)],
            ),
            None => (b.attr(value, "to_string"), vec![]),
        };
        ExpressionKind::Call {
            callee: callee.boxed(),
            args,
        }
    }
}

impl VisitorMut for LoopLowering<'_> {
    fn visit_statement(&mut self, statement: &mut Statement) {
        walk_statement(self, statement);
        let location = statement.location;
        match &mut statement.kind {
            StatementKind::Loop { body } => {
                let body = mem::take(body);
                statement.kind = StatementKind::While {
                    condition: self.at(location).bool_(true),
                    body,
                };
                self.loops += 1;
            }
            StatementKind::For {
                variable,
                iterable,
                body,
                iteration,
            } => {
                let Some(iteration) = *iteration else {
                    self.sink.error(
                        ErrorCode::E9001,
                        location,
                        "for-loop reached lowering without an iteration strategy",
                    );
                    return;
                };
                let variable = Rc::clone(variable);
                let source = mem::take(iterable);
                let body = mem::take(&mut **body);
                statement.kind = match iteration {
                    Iteration::Array { size } => {
                        self.array_loop(&variable, source, body, size, location)
                    }
                    Iteration::Iterable => self.iterator_loop(&variable, source, body, location),
                    Iteration::Sequence => self.sequence_loop(&variable, source, body, location),
                };
                self.loops += 1;
            }
            _ => {}
        }
    }

    fn visit_expression(&mut self, expression: &mut Expression) {
        walk_expression(self, expression);
        let location = expression.location;
        match &mut expression.kind {
            ExpressionKind::GetIndex { base, indices }
                if base.ty.as_array().is_none() && query::has_get(&base.ty) =>
            {
                let base = mem::take(&mut **base);
                let indices = mem::take(indices);
                let b = self.at(location);
                let args = indices.into_iter().map(|index| b.arg(index)).collect();
                expression.kind = ExpressionKind::Call {
                    callee: b.attr(base, "get").boxed(),
                    args,
                };
            }
            ExpressionKind::ToString(value) => {
                let value = mem::take(&mut **value);
                expression.kind = self.to_string(value, location);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests;
