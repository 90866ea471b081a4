//! Mutable tree traversal.
//!
//! [`VisitorMut`] walks a module's definitions, statements and expressions
//! and hands out every type slot it passes. Default methods call the
//! matching `walk_*` function, so an implementation overrides only the nodes
//! it cares about and calls `walk_*` to continue into children.
//!
//! # Type slots
//!
//! Types stored directly on tree nodes and in the `RefCell`s of variables,
//! parameters and member variables are passed as real slots: replacing the
//! handle rewires that node. Signature types of definitions (return types,
//! struct fields, enum payloads, alias targets) are immutable handles; the
//! visitor receives a copy of the handle, so only in-place cell updates
//! through [`Type::set`](crate::Type::set) reach them.
//!
//! # Example
//!
//! ```text
//! struct CountCalls(usize);
//!
//! impl VisitorMut for CountCalls {
//!     fn visit_expression(&mut self, expression: &mut Expression) {
//!         if matches!(expression.kind, ExpressionKind::Call { .. }) {
//!             self.0 += 1;
//!         }
//!         walk_expression(self, expression);
//!     }
//! }
//! ```

use slang_stack::ensure_sufficient_stack;

use crate::ast::{CaseArm, Expression, ExpressionKind, Statement, StatementKind};
use crate::{Definition, Module, Type};

pub trait VisitorMut {
    fn visit_module(&mut self, module: &mut Module) {
        walk_module(self, module);
    }

    fn visit_definition(&mut self, definition: &Definition) {
        walk_definition(self, definition);
    }

    fn visit_statement(&mut self, statement: &mut Statement) {
        walk_statement(self, statement);
    }

    fn visit_case_arm(&mut self, arm: &mut CaseArm) {
        walk_case_arm(self, arm);
    }

    fn visit_expression(&mut self, expression: &mut Expression) {
        walk_expression(self, expression);
    }

    fn visit_type(&mut self, ty: &mut Type) {
        let _ = ty;
    }
}

pub fn walk_module<V: VisitorMut + ?Sized>(visitor: &mut V, module: &mut Module) {
    for definition in &module.definitions {
        visitor.visit_definition(definition);
    }
}

/// Visit an immutable signature type through a copy of its handle.
fn visit_signature_type<V: VisitorMut + ?Sized>(visitor: &mut V, ty: &Type) {
    let mut copy = ty.clone();
    visitor.visit_type(&mut copy);
}

pub fn walk_definition<V: VisitorMut + ?Sized>(visitor: &mut V, definition: &Definition) {
    match definition {
        Definition::Function(function) => {
            if let Some(this) = function.this_param.get() {
                visitor.visit_type(&mut this.ty.borrow_mut());
            }
            for parameter in &function.parameters {
                visitor.visit_type(&mut parameter.ty.borrow_mut());
            }
            visit_signature_type(visitor, &function.return_ty);
            visit_signature_type(visitor, &function.except_ty);
            visitor.visit_statement(&mut function.body.borrow_mut());
        }
        Definition::ExternFunction(function) => {
            for parameter in &function.parameters {
                visitor.visit_type(&mut parameter.ty.borrow_mut());
            }
            visit_signature_type(visitor, &function.return_ty);
        }
        Definition::FunctionDecl(decl) => {
            for parameter in &decl.parameters {
                visitor.visit_type(&mut parameter.ty.borrow_mut());
            }
            visit_signature_type(visitor, &decl.return_ty);
            visit_signature_type(visitor, &decl.except_ty);
        }
        Definition::Struct(def) => {
            for field in &def.fields {
                visit_signature_type(visitor, &field.ty);
            }
        }
        Definition::Enum(def) => {
            for variant in &def.variants {
                for ty in &variant.payload {
                    visit_signature_type(visitor, ty);
                }
            }
        }
        Definition::Class(def) => {
            for field in &def.fields {
                visitor.visit_definition(&Definition::VarDef(field.clone()));
            }
            for method in &def.methods {
                visitor.visit_definition(&Definition::Function(method.clone()));
            }
        }
        Definition::Interface(def) => {
            for method in &def.methods {
                visitor.visit_definition(&Definition::FunctionDecl(method.clone()));
            }
        }
        Definition::VarDef(var) => {
            visitor.visit_type(&mut var.ty.borrow_mut());
            if let Some(value) = var.value.borrow_mut().as_mut() {
                visitor.visit_expression(value);
            }
        }
        Definition::TypeDef(alias) => visit_signature_type(visitor, &alias.ty),
        Definition::Module(_)
        | Definition::Variable(_)
        | Definition::Parameter(_)
        | Definition::TypeParameter(_)
        | Definition::EnumVariant(_)
        | Definition::Field(_) => {}
    }
}

pub fn walk_statement<V: VisitorMut + ?Sized>(visitor: &mut V, statement: &mut Statement) {
    ensure_sufficient_stack(|| {
        match &mut statement.kind {
            StatementKind::Pass
            | StatementKind::Break
            | StatementKind::Continue
            | StatementKind::Unreachable => {}
            StatementKind::Compound(statements) => {
                for inner in statements {
                    visitor.visit_statement(inner);
                }
            }
            StatementKind::Expression(value) | StatementKind::Raise(value) => {
                visitor.visit_expression(value);
            }
            StatementKind::Let {
                variable,
                type_hint,
                value,
            } => {
                if let Some(hint) = type_hint {
                    visitor.visit_type(hint);
                }
                visitor.visit_expression(value);
                visitor.visit_type(&mut variable.ty.borrow_mut());
            }
            StatementKind::Assignment { target, value, .. } => {
                visitor.visit_expression(target);
                visitor.visit_expression(value);
            }
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                visitor.visit_expression(condition);
                visitor.visit_statement(then_branch);
                visitor.visit_statement(else_branch);
            }
            StatementKind::While { condition, body } => {
                visitor.visit_expression(condition);
                visitor.visit_statement(body);
            }
            StatementKind::Loop { body } => visitor.visit_statement(body),
            StatementKind::For {
                variable,
                iterable,
                body,
                ..
            } => {
                visitor.visit_expression(iterable);
                visitor.visit_type(&mut variable.ty.borrow_mut());
                visitor.visit_statement(body);
            }
            StatementKind::Case {
                value,
                arms,
                else_branch,
            } => {
                visitor.visit_expression(value);
                for arm in arms {
                    visitor.visit_case_arm(arm);
                }
                if let Some(else_branch) = else_branch {
                    visitor.visit_statement(else_branch);
                }
            }
            StatementKind::Switch {
                value,
                arms,
                default,
            } => {
                visitor.visit_expression(value);
                for arm in arms {
                    visitor.visit_statement(&mut arm.body);
                }
                visitor.visit_statement(default);
            }
            StatementKind::Return(value) => {
                if let Some(value) = value {
                    visitor.visit_expression(value);
                }
            }
            StatementKind::Try {
                body,
                except_ty,
                variable,
                handler,
            } => {
                visitor.visit_type(except_ty);
                visitor.visit_statement(body);
                visitor.visit_type(&mut variable.ty.borrow_mut());
                visitor.visit_statement(handler);
            }
        }
        visitor.visit_type(&mut statement.ty);
    });
}

pub fn walk_case_arm<V: VisitorMut + ?Sized>(visitor: &mut V, arm: &mut CaseArm) {
    for variable in &arm.variables {
        visitor.visit_type(&mut variable.ty.borrow_mut());
    }
    visitor.visit_statement(&mut arm.body);
}

pub fn walk_expression<V: VisitorMut + ?Sized>(visitor: &mut V, expression: &mut Expression) {
    ensure_sufficient_stack(|| {
        match &mut expression.kind {
            ExpressionKind::Undefined
            | ExpressionKind::Int(_)
            | ExpressionKind::Float(_)
            | ExpressionKind::Str(_)
            | ExpressionKind::Char(_)
            | ExpressionKind::Bool(_)
            | ExpressionKind::Name(_)
            | ExpressionKind::Ref(_) => {}
            ExpressionKind::TypeLiteral(ty) => visitor.visit_type(ty),
            ExpressionKind::VariantRef { enum_ty, .. } => visitor.visit_type(enum_ty),
            ExpressionKind::GetAttr { base, .. } => visitor.visit_expression(base),
            ExpressionKind::GetIndex { base, indices } => {
                visitor.visit_expression(base);
                for index in indices {
                    visitor.visit_expression(index);
                }
            }
            ExpressionKind::Binop { lhs, rhs, .. } => {
                visitor.visit_expression(lhs);
                visitor.visit_expression(rhs);
            }
            ExpressionKind::Unop { operand, .. } => visitor.visit_expression(operand),
            ExpressionKind::Call { callee, args } => {
                visitor.visit_expression(callee);
                for arg in args {
                    visitor.visit_expression(&mut arg.value);
                }
            }
            ExpressionKind::ArrayLiteral(values) => {
                for value in values {
                    visitor.visit_expression(value);
                }
            }
            ExpressionKind::StructLiteral { ty, values } => {
                visitor.visit_type(ty);
                for value in values {
                    visitor.visit_expression(value);
                }
            }
            ExpressionKind::UnionLiteral { ty, value, .. } => {
                visitor.visit_type(ty);
                visitor.visit_expression(value);
            }
            ExpressionKind::EnumLiteral {
                enum_ty, values, ..
            } => {
                visitor.visit_type(enum_ty);
                for value in values {
                    visitor.visit_expression(value);
                }
            }
            ExpressionKind::ClassLiteral { ty, args } => {
                visitor.visit_type(ty);
                for arg in args {
                    visitor.visit_expression(&mut arg.value);
                }
            }
            ExpressionKind::TypeCast { ty, value } | ExpressionKind::Unbox { value, ty } => {
                visitor.visit_type(ty);
                visitor.visit_expression(value);
            }
            ExpressionKind::ToString(value) | ExpressionKind::Box(value) => {
                visitor.visit_expression(value);
            }
        }
        visitor.visit_type(&mut expression.ty);
    });
}
