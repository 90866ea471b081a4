//! Union erasure.
//!
//! Unions become the opaque `ptr` type. Building a union boxes the member
//! value; reading a member unboxes the pointer as the member's static type.
//! Nothing records which member was stored, so reading any other member
//! reinterprets the value.
//!
//! ```text
//! ShapeData { Label: s }     box(s)
//! shape.data.Label           unbox[str](shape.data)
//! ```

use std::mem;

use slang_diagnostic::{DiagnosticSink, Diagnostics, ErrorCode};
use slang_ir::visitor::{walk_expression, VisitorMut};
use slang_ir::{BaseType, Definition, Expression, ExpressionKind, Module, Type, TypeKind};
use slang_types::query;
use tracing::debug;

use crate::for_each_module;
use crate::retype::TypeSwap;

pub(crate) fn erase_unions(modules: &mut [Module]) -> Result<(), Diagnostics> {
    for_each_module(modules, erase_uses)?;
    let swapped = TypeSwap::new(|ty: &Type| {
        ty.is_union().then_some(TypeKind::Base(BaseType::Ptr))
    })
    .modules(modules);
    let mut removed = 0;
    for module in modules.iter_mut() {
        let before = module.definitions.len();
        module
            .definitions
            .retain(|definition| !matches!(definition, Definition::Struct(def) if def.is_union));
        removed += before - module.definitions.len();
    }
    debug!(removed, swapped, "erased unions");
    Ok(())
}

fn erase_uses(module: &mut Module) -> Result<(), Diagnostics> {
    let mut erasure = UnionUses {
        sink: DiagnosticSink::new(module.name()),
    };
    for definition in &module.definitions {
        erasure.visit_definition(definition);
    }
    erasure.sink.finish()
}

struct UnionUses {
    sink: DiagnosticSink,
}

impl VisitorMut for UnionUses {
    fn visit_expression(&mut self, expression: &mut Expression) {
        // Member types are read off the union before its operand is erased.
        let member = match &expression.kind {
            ExpressionKind::GetAttr { base, attr } if base.ty.is_union() => {
                Some(query::field_type(&base.ty, attr).ok_or_else(|| attr.clone()))
            }
            _ => None,
        };
        walk_expression(self, expression);
        match (&mut expression.kind, member) {
            (ExpressionKind::UnionLiteral { value, .. }, _) => {
                let value = mem::take(value);
                expression.kind = ExpressionKind::Box(value);
            }
            (ExpressionKind::GetAttr { base, .. }, Some(Ok(ty))) => {
                let value = mem::take(base);
                expression.kind = ExpressionKind::Unbox { value, ty };
            }
            (ExpressionKind::GetAttr { base, .. }, Some(Err(attr))) => {
                self.sink.error(
                    ErrorCode::E9001,
                    expression.location,
                    format!("union `{}` has no member `{attr}`", base.ty),
                );
            }
            _ => {}
        }
    }
}
