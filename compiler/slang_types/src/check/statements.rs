//! Statement checking.

use std::rc::Rc;

use rustc_hash::FxHashSet;
use slang_diagnostic::ErrorCode;
use slang_ir::{
    BinaryOp, CaseArm, Definition, Expression, ExpressionKind, Location, Statement, StatementKind,
    Type,
};
use slang_stack::ensure_sufficient_stack;

use super::{Checked, TypeChecker};
use crate::query;
use crate::unify::{coerce, merge_paths, unify};

impl TypeChecker {
    pub(super) fn check_statement(&mut self, statement: &mut Statement) -> Checked {
        ensure_sufficient_stack(|| {
            let location = statement.location;
            let ty = self.statement_type(&mut statement.kind, location)?;
            statement.ty = ty;
            Ok(())
        })
    }

    fn statement_type(&mut self, kind: &mut StatementKind, location: Location) -> Checked<Type> {
        match kind {
            StatementKind::Pass => Ok(Type::void()),
            StatementKind::Break | StatementKind::Continue | StatementKind::Unreachable => {
                Ok(Type::unreachable())
            }
            StatementKind::Compound(statements) => self.check_compound(statements),
            StatementKind::Expression(value) => {
                self.check_expression(value)?;
                Ok(value.ty.clone())
            }
            StatementKind::Let {
                variable,
                type_hint,
                value,
            } => {
                self.check_expression(value)?;
                let ty = match type_hint {
                    Some(hint) => {
                        self.coerce_to(value, hint)?;
                        hint.clone()
                    }
                    None => value.ty.clone(),
                };
                *variable.ty.borrow_mut() = ty;
                Ok(Type::void())
            }
            StatementKind::Assignment { target, op, value } => {
                self.check_expression(target)?;
                self.check_assignable(target)?;
                self.check_expression(value)?;
                if let Some(op) = op {
                    let ty = &target.ty;
                    let legal = ty.is_numeric() || (ty.is_str() && *op == BinaryOp::Add);
                    if !legal {
                        return self.fail(
                            ErrorCode::E2001,
                            location,
                            format!("`{}=` is not defined for `{ty}`", op.as_symbol()),
                        );
                    }
                }
                let target_ty = target.ty.clone();
                self.coerce_to(value, &target_ty)?;
                Ok(Type::void())
            }
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check_condition(condition)?;
                self.check_statement(then_branch)?;
                self.check_statement(else_branch)?;
                self.merge(&then_branch.ty, &else_branch.ty, else_branch.location)
            }
            StatementKind::While { condition, body } => {
                self.check_condition(condition)?;
                self.check_statement(body)?;
                Ok(Type::void())
            }
            StatementKind::Loop { body } => {
                self.check_statement(body)?;
                Ok(Type::void())
            }
            StatementKind::For {
                variable,
                iterable,
                body,
                iteration,
            } => {
                self.check_expression(iterable)?;
                let Some((how, element)) = query::iteration(&iterable.ty) else {
                    return self.fail(
                        ErrorCode::E2011,
                        iterable.location,
                        format!("cannot iterate over `{}`", iterable.ty),
                    );
                };
                *iteration = Some(how);
                *variable.ty.borrow_mut() = element;
                self.check_statement(body)?;
                Ok(Type::void())
            }
            StatementKind::Case {
                value,
                arms,
                else_branch,
            } => self.check_case(value, arms, else_branch.as_deref_mut(), location),
            StatementKind::Switch {
                value,
                arms,
                default,
            } => {
                self.check_expression(value)?;
                self.coerce_to(value, &Type::int())?;
                let mut ty = Type::unreachable();
                for arm in arms.iter_mut() {
                    self.check_statement(&mut arm.body)?;
                    ty = self.merge(&ty, &arm.body.ty, arm.location)?;
                }
                self.check_statement(default)?;
                self.merge(&ty, &default.ty, default.location)
            }
            StatementKind::Return(value) => {
                let Some(expected) = self.return_ty.clone() else {
                    return self.fail(ErrorCode::E9001, location, "return outside of a function");
                };
                match value {
                    Some(value) => {
                        self.check_expression(value)?;
                        self.coerce_to(value, &expected)?;
                    }
                    None if !unify(&expected, &Type::void()) => {
                        return self.fail(
                            ErrorCode::E2001,
                            location,
                            format!("expected a return value of type `{expected}`"),
                        );
                    }
                    None => {}
                }
                Ok(Type::unreachable())
            }
            StatementKind::Raise(value) => {
                self.check_expression(value)?;
                let handler = self.except_stack.last().cloned();
                let accepted = handler.is_some_and(|handler| coerce(value, &handler).is_ok());
                if !accepted {
                    return self.fail(
                        ErrorCode::E2009,
                        value.location,
                        format!("no handler accepts an exception of type `{}`", value.ty),
                    );
                }
                Ok(Type::unreachable())
            }
            StatementKind::Try {
                body,
                except_ty,
                variable,
                handler,
            } => {
                self.except_stack.push(except_ty.clone());
                let guarded = self.check_statement(body);
                self.except_stack.pop();
                guarded?;
                *variable.ty.borrow_mut() = except_ty.clone();
                self.check_statement(handler)?;
                self.merge(&body.ty, &handler.ty, handler.location)
            }
        }
    }

    /// A sequence types as its final member; the others must be `void`.
    fn check_compound(&mut self, statements: &mut [Statement]) -> Checked<Type> {
        let count = statements.len();
        for (i, statement) in statements.iter_mut().enumerate() {
            self.check_statement(statement)?;
            if i + 1 < count && !statement.ty.is_void() {
                return self.fail(
                    ErrorCode::E2015,
                    statement.location,
                    format!("statement of type `{}` is not the last in its block", statement.ty),
                );
            }
        }
        Ok(statements
            .last()
            .map_or_else(Type::void, |last| last.ty.clone()))
    }

    fn check_case(
        &mut self,
        value: &mut Expression,
        arms: &mut [CaseArm],
        else_branch: Option<&mut Statement>,
        location: Location,
    ) -> Checked<Type> {
        self.check_expression(value)?;
        let Some(def) = value.ty.enum_def() else {
            return self.fail(
                ErrorCode::E2001,
                value.location,
                format!("case over `{}`, which is not an enum", value.ty),
            );
        };
        let mut seen = FxHashSet::default();
        let mut ty = Type::unreachable();
        for arm in arms.iter_mut() {
            let Some((variant, payload)) = query::variant(&value.ty, &arm.name) else {
                return self.fail(
                    ErrorCode::E2007,
                    arm.location,
                    format!("`{}` has no variant `{}`", value.ty, arm.name),
                );
            };
            if !seen.insert(variant.index) {
                return self.fail(
                    ErrorCode::E2018,
                    arm.location,
                    format!("variant `{}` is handled twice", arm.name),
                );
            }
            if payload.len() != arm.variables.len() {
                return self.fail(
                    ErrorCode::E2002,
                    arm.location,
                    format!(
                        "variant `{}` carries {} values, but the arm binds {}",
                        arm.name,
                        payload.len(),
                        arm.variables.len()
                    ),
                );
            }
            for (variable, ty) in arm.variables.iter().zip(payload) {
                *variable.ty.borrow_mut() = ty;
            }
            arm.variant = Some(variant);
            self.check_statement(&mut arm.body)?;
            ty = self.merge(&ty, &arm.body.ty, arm.location)?;
        }
        match else_branch {
            Some(else_branch) => {
                self.check_statement(else_branch)?;
                self.merge(&ty, &else_branch.ty, else_branch.location)
            }
            None => {
                let missing: Vec<&str> = def
                    .variants
                    .iter()
                    .filter(|v| !seen.contains(&v.index))
                    .map(|v| v.id.name())
                    .collect();
                if missing.is_empty() {
                    Ok(ty)
                } else {
                    self.fail(
                        ErrorCode::E2008,
                        location,
                        format!("variants not covered: {}", missing.join(", ")),
                    )
                }
            }
        }
    }

    /// Variables, parameters, member variables, fields and array elements.
    fn check_assignable(&mut self, target: &Expression) -> Checked {
        let defaulted = match &target.kind {
            ExpressionKind::GetAttr { base, attr } => base
                .ty
                .class_def()
                .and_then(|class| class.field(attr).cloned())
                .filter(|member| member.has_default()),
            ExpressionKind::Ref(Definition::VarDef(member)) if member.has_default() => {
                Some(Rc::clone(member))
            }
            _ => None,
        };
        if let Some(member) = defaulted {
            // Defaulted members lower to per-class constants.
            return self.fail(
                ErrorCode::E3001,
                target.location,
                format!("cannot assign to `{}`, a defaulted class member", member.id.name()),
            );
        }
        let legal = match &target.kind {
            ExpressionKind::Ref(definition) => matches!(
                definition,
                Definition::Variable(_) | Definition::Parameter(_) | Definition::VarDef(_)
            ),
            ExpressionKind::GetAttr { .. } => true,
            // `get` receivers have no assignable storage.
            ExpressionKind::GetIndex { base, .. } => base.ty.as_array().is_some(),
            _ => false,
        };
        if legal {
            Ok(())
        } else {
            self.fail(
                ErrorCode::E2017,
                target.location,
                "cannot assign to this expression",
            )
        }
    }

    fn check_condition(&mut self, condition: &mut Expression) -> Checked {
        self.check_expression(condition)?;
        self.coerce_to(condition, &Type::bool())
    }

    pub(super) fn coerce_to(&mut self, value: &mut Expression, expected: &Type) -> Checked {
        let location = value.location;
        match coerce(value, expected) {
            Ok(()) => Ok(()),
            Err(mismatch) => self.mismatch(location, &mismatch),
        }
    }

    fn merge(&mut self, acc: &Type, branch: &Type, location: Location) -> Checked<Type> {
        match merge_paths(acc, branch) {
            Ok(ty) => Ok(ty),
            Err(mismatch) => self.mismatch(location, &mismatch),
        }
    }
}
