//! Expression checking.

use std::mem;

use slang_diagnostic::ErrorCode;
use slang_ir::{
    BinaryOp, Definition, Expression, ExpressionKind, FunctionType, LabeledExpression, Location,
    Type, UnaryOp,
};
use slang_stack::ensure_sufficient_stack;

use super::{Checked, TypeChecker};
use crate::query;
use crate::subst::{fresh_instance, subst_signature};

impl TypeChecker {
    pub(super) fn check_expression(&mut self, expression: &mut Expression) -> Checked {
        ensure_sufficient_stack(|| {
            let location = expression.location;
            let ty = self.expression_type(&mut expression.kind, location)?;
            expression.ty = ty;
            Ok(())
        })
    }

    fn expression_type(&mut self, kind: &mut ExpressionKind, location: Location) -> Checked<Type> {
        match kind {
            ExpressionKind::Int(_) => Ok(Type::int()),
            ExpressionKind::Float(_) => Ok(Type::float()),
            ExpressionKind::Str(_) => Ok(Type::str()),
            ExpressionKind::Char(_) => Ok(Type::char()),
            ExpressionKind::Bool(_) => Ok(Type::bool()),
            ExpressionKind::Undefined | ExpressionKind::Name(_) => self.fail(
                ErrorCode::E9001,
                location,
                "unresolved name reached the type checker",
            ),
            ExpressionKind::VariantRef { variant, .. } => self.fail(
                ErrorCode::E9001,
                location,
                format!("variant selector `{}` was not reclassified", variant.id.name()),
            ),
            ExpressionKind::TypeLiteral(ty) => self.fail(
                ErrorCode::E2016,
                location,
                format!("type `{ty}` used as a value"),
            ),
            ExpressionKind::Ref(definition) => self.reference_type(definition, location),
            ExpressionKind::GetAttr { base, attr } => {
                self.check_expression(base)?;
                match query::member_type(&base.ty, attr) {
                    Some(ty) => Ok(ty),
                    None => self.fail(
                        ErrorCode::E2006,
                        location,
                        format!("`{}` has no field or method `{attr}`", base.ty),
                    ),
                }
            }
            ExpressionKind::GetIndex { base, indices } => self.check_index(base, indices, location),
            ExpressionKind::Binop { op, lhs, rhs } => self.check_binop(*op, lhs, rhs, location),
            ExpressionKind::Unop { op, operand } => {
                self.check_expression(operand)?;
                let legal = match op {
                    UnaryOp::Neg => operand.ty.is_numeric(),
                    UnaryOp::Not => operand.ty.is_bool(),
                };
                if legal {
                    Ok(operand.ty.clone())
                } else {
                    self.fail(
                        ErrorCode::E2001,
                        location,
                        format!("unary operator not defined for `{}`", operand.ty),
                    )
                }
            }
            ExpressionKind::Call { callee, args } => {
                if let ExpressionKind::TypeLiteral(ty) = &callee.kind {
                    if ty.is_class() {
                        let ty = ty.clone();
                        let args = mem::take(args);
                        *kind = ExpressionKind::ClassLiteral { ty, args };
                        return self.expression_type(kind, location);
                    }
                }
                self.check_call(callee, args, location)
            }
            ExpressionKind::ArrayLiteral(values) => {
                let Some((first, rest)) = values.split_first_mut() else {
                    return self.fail(
                        ErrorCode::E2001,
                        location,
                        "cannot infer the element type of an empty array",
                    );
                };
                self.check_expression(first)?;
                let element = first.ty.clone();
                for value in rest {
                    self.check_expression(value)?;
                    self.coerce_to(value, &element)?;
                }
                Ok(Type::array(values.len(), element))
            }
            ExpressionKind::StructLiteral { ty, values } => {
                let Some(fields) = query::struct_fields(ty) else {
                    return self.fail(
                        ErrorCode::E9001,
                        location,
                        format!("struct literal of non-struct type `{ty}`"),
                    );
                };
                if fields.len() != values.len() {
                    return self.fail(
                        ErrorCode::E2002,
                        location,
                        format!(
                            "`{ty}` has {} fields, found {} values",
                            fields.len(),
                            values.len()
                        ),
                    );
                }
                for (value, (_, field_ty)) in values.iter_mut().zip(&fields) {
                    self.check_expression(value)?;
                    self.coerce_to(value, field_ty)?;
                }
                Ok(ty.clone())
            }
            ExpressionKind::UnionLiteral { ty, field, value } => {
                let Some(field_ty) = query::field_type(ty, field) else {
                    return self.fail(
                        ErrorCode::E2006,
                        location,
                        format!("`{ty}` has no field `{field}`"),
                    );
                };
                self.check_expression(value)?;
                self.coerce_to(value, &field_ty)?;
                Ok(ty.clone())
            }
            ExpressionKind::EnumLiteral {
                enum_ty,
                variant,
                values,
            } => {
                let payload = query::variant_payload(enum_ty, variant);
                if payload.len() != values.len() {
                    return self.fail(
                        ErrorCode::E2002,
                        location,
                        format!(
                            "variant `{}` carries {} values, found {}",
                            variant.id.name(),
                            payload.len(),
                            values.len()
                        ),
                    );
                }
                for (value, expected) in values.iter_mut().zip(&payload) {
                    self.check_expression(value)?;
                    self.coerce_to(value, expected)?;
                }
                Ok(enum_ty.clone())
            }
            ExpressionKind::ClassLiteral { ty, args } => {
                let Some(params) = query::constructor_parameters(ty) else {
                    return self.fail(
                        ErrorCode::E9001,
                        location,
                        format!("class literal of non-class type `{ty}`"),
                    );
                };
                let (param_names, params): (Vec<_>, Vec<_>) = params
                    .into_iter()
                    .map(|(name, ty)| (Some(name), ty))
                    .unzip();
                let signature = FunctionType {
                    param_names,
                    params,
                    ret: ty.clone(),
                    except: Type::void(),
                };
                self.check_arguments(&signature, args, location)?;
                Ok(ty.clone())
            }
            ExpressionKind::TypeCast { ty, value } => {
                self.check_expression(value)?;
                if !value.ty.is_numeric() || !ty.is_numeric() {
                    return self.fail(
                        ErrorCode::E2001,
                        location,
                        format!("cannot cast `{}` to `{ty}`", value.ty),
                    );
                }
                Ok(ty.clone())
            }
            ExpressionKind::ToString(value) => {
                self.check_expression(value)?;
                let ty = &value.ty;
                let convertible = ty.is_str()
                    || ty.is_int()
                    || ty.is_char()
                    || query::method_signature(ty, "to_string")
                        .is_some_and(|sig| sig.params.is_empty() && sig.ret.is_str());
                if !convertible {
                    return self.fail(
                        ErrorCode::E2014,
                        location,
                        format!("cannot convert `{ty}` to a string"),
                    );
                }
                Ok(Type::str())
            }
            ExpressionKind::Box(value) => {
                self.check_expression(value)?;
                Ok(Type::ptr())
            }
            ExpressionKind::Unbox { value, ty } => {
                self.check_expression(value)?;
                Ok(ty.clone())
            }
        }
    }

    fn reference_type(&mut self, definition: &Definition, location: Location) -> Checked<Type> {
        match definition {
            Definition::Variable(var) => Ok(var.ty.borrow().clone()),
            Definition::Parameter(param) => Ok(param.ty.borrow().clone()),
            Definition::VarDef(var) => Ok(var.ty.borrow().clone()),
            Definition::Function(function) => {
                let signature = function.signature();
                if function.is_generic() {
                    let (mapping, _) = fresh_instance(&function.type_parameters);
                    Ok(Type::function(subst_signature(&signature, &mapping)))
                } else {
                    Ok(Type::function(signature))
                }
            }
            Definition::ExternFunction(function) => Ok(Type::function(function.signature())),
            other => self.fail(
                ErrorCode::E2016,
                location,
                format!("{} `{}` used as a value", other.describe(), other.name()),
            ),
        }
    }

    fn check_index(
        &mut self,
        base: &mut Expression,
        indices: &mut [Expression],
        location: Location,
    ) -> Checked<Type> {
        self.check_expression(base)?;
        let (index_ty, element) = if let Some((_, element)) = base.ty.as_array() {
            (Type::int(), element)
        } else if let Some(get) = query::method_signature(&base.ty, "get")
            .filter(|sig| sig.params.len() == 1)
        {
            (get.params[0].clone(), get.ret)
        } else {
            return self.fail(
                ErrorCode::E2001,
                location,
                format!("cannot index `{}`", base.ty),
            );
        };
        let count = indices.len();
        let [index] = indices else {
            return self.fail(
                ErrorCode::E2012,
                location,
                format!("expected one index, found {count}"),
            );
        };
        self.check_expression(index)?;
        self.coerce_to(index, &index_ty)?;
        Ok(element)
    }

    fn check_binop(
        &mut self,
        op: BinaryOp,
        lhs: &mut Expression,
        rhs: &mut Expression,
        location: Location,
    ) -> Checked<Type> {
        self.check_expression(lhs)?;
        self.check_expression(rhs)?;
        if op.is_logical() {
            self.coerce_to(lhs, &Type::bool())?;
            self.coerce_to(rhs, &Type::bool())?;
            return Ok(Type::bool());
        }
        // Mixed int/float arithmetic widens the int side.
        let operand = if lhs.ty.is_int() && rhs.ty.is_float() {
            rhs.ty.clone()
        } else {
            lhs.ty.clone()
        };
        self.coerce_to(lhs, &operand)?;
        self.coerce_to(rhs, &operand)?;
        if op.is_comparison() {
            return Ok(Type::bool());
        }
        if operand.is_numeric() || (operand.is_str() && op == BinaryOp::Add) {
            Ok(operand)
        } else {
            self.fail(
                ErrorCode::E2001,
                location,
                format!("`{}` is not defined for `{operand}`", op.as_symbol()),
            )
        }
    }

    fn check_call(
        &mut self,
        callee: &mut Expression,
        args: &mut [LabeledExpression],
        location: Location,
    ) -> Checked<Type> {
        self.check_expression(callee)?;
        let Some(signature) = callee.ty.as_function() else {
            return self.fail(
                ErrorCode::E2010,
                callee.location,
                format!("`{}` is not callable", callee.ty),
            );
        };
        self.check_arguments(&signature, args, location)?;
        if !signature.except.is_void() && !self.handler_accepts(&signature.except) {
            return self.fail(
                ErrorCode::E2009,
                location,
                format!(
                    "call may raise `{}`, which no enclosing handler accepts",
                    signature.except
                ),
            );
        }
        Ok(signature.ret)
    }
}
