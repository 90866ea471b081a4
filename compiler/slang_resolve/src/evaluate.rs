//! Type evaluation.
//!
//! Runs after name binding. Generic type constructors written without
//! arguments get one fresh placeholder per type parameter, wherever they
//! appear. Calls whose callee denotes a type or an enum variant are not
//! calls at all; they are reclassified into the construction they spell:
//!
//! | Callee | Becomes |
//! |--------|---------|
//! | struct type | struct literal, values in declaration order |
//! | `int`, `float` | numeric cast |
//! | `str` | string conversion |
//! | `Enum.Variant` | enum literal |
//! | class type | class literal |
//!
//! An `Enum.Variant` selector that is not called is a payload-less enum
//! literal.

use std::mem;
use std::rc::Rc;

use slang_diagnostic::{Diagnostics, DiagnosticSink, ErrorCode};
use slang_ir::defs::{EnumVariant, StructDef};
use slang_ir::visitor::{walk_expression, VisitorMut};
use slang_ir::{
    BaseType, Expression, ExpressionKind, LabeledExpression, Location, Module, Type, TypeKind,
};
use slang_stack::ensure_sufficient_stack;
use tracing::debug;

/// Instantiate bare constructors and reclassify construction calls.
#[tracing::instrument(level = "debug", skip_all, fields(module = %module.name()))]
pub fn evaluate_types(module: &Module) -> Result<(), Diagnostics> {
    let mut evaluator = TypeEvaluator {
        sink: DiagnosticSink::new(module.name()),
        constructions: 0,
    };
    for definition in &module.definitions {
        evaluator.visit_definition(definition);
    }
    debug!(constructions = evaluator.constructions, "evaluated types");
    evaluator.sink.finish()
}

struct TypeEvaluator {
    sink: DiagnosticSink,
    constructions: usize,
}

/// Give every unapplied constructor inside `ty` fresh placeholder arguments.
fn instantiate(ty: &Type) {
    ensure_sufficient_stack(|| {
        let kind = ty.kind().clone();
        match kind {
            TypeKind::Unapplied(tycon) => {
                let args = tycon
                    .type_parameters()
                    .iter()
                    .map(|param| Type::meta(param.id.name()))
                    .collect();
                ty.set(TypeKind::App { tycon, args });
            }
            TypeKind::App { args, .. } => args.iter().for_each(instantiate),
            TypeKind::Function(signature) => {
                signature.params.iter().for_each(instantiate);
                instantiate(&signature.ret);
                instantiate(&signature.except);
            }
            TypeKind::Array { element, .. } | TypeKind::Pointer(element) => instantiate(&element),
            TypeKind::Meta {
                resolved: Some(target),
                ..
            } => instantiate(&target),
            TypeKind::Base(_)
            | TypeKind::Meta { resolved: None, .. }
            | TypeKind::Param(_)
            | TypeKind::Syntax(_)
            | TypeKind::Unreachable
            | TypeKind::Void => {}
        }
    });
}

impl TypeEvaluator {
    /// `Enum.Variant`, if `expression` selects a variant.
    fn variant_of(&mut self, expression: &Expression) -> Option<(Type, Option<Rc<EnumVariant>>)> {
        let ExpressionKind::GetAttr { base, attr } = &expression.kind else {
            return None;
        };
        let ExpressionKind::TypeLiteral(enum_ty) = &base.kind else {
            return None;
        };
        let def = enum_ty.enum_def()?;
        let variant = def.variant(attr).cloned();
        if variant.is_none() {
            self.sink.error(
                ErrorCode::E2007,
                expression.location,
                format!("enum `{}` has no variant `{attr}`", def.id),
            );
        }
        Some((enum_ty.clone(), variant))
    }

    /// Visit a callee without turning a variant selector into a literal.
    fn visit_callee(&mut self, callee: &mut Expression) {
        if let ExpressionKind::GetAttr { base, .. } = &mut callee.kind {
            self.visit_expression(base);
        } else {
            self.visit_expression(callee);
            return;
        }
        match self.variant_of(callee) {
            Some((enum_ty, Some(variant))) => {
                callee.kind = ExpressionKind::VariantRef { enum_ty, variant };
            }
            Some((_, None)) => callee.kind = ExpressionKind::Undefined,
            None => {}
        }
    }

    /// Rewrite `expression`, a call, into the construction its callee names.
    fn reclassify(&mut self, expression: &mut Expression) {
        let location = expression.location;
        let ExpressionKind::Call { callee, args } = &mut expression.kind else {
            return;
        };
        let kind = match &callee.kind {
            ExpressionKind::TypeLiteral(ty) => {
                let ty = ty.clone();
                let args = mem::take(args);
                self.construct(&ty, args, location)
            }
            ExpressionKind::VariantRef { enum_ty, variant } => ExpressionKind::EnumLiteral {
                enum_ty: enum_ty.clone(),
                variant: Rc::clone(variant),
                values: mem::take(args).into_iter().map(|arg| arg.value).collect(),
            },
            _ => return,
        };
        self.constructions += 1;
        expression.kind = kind;
    }

    fn construct(
        &mut self,
        ty: &Type,
        args: Vec<LabeledExpression>,
        location: Location,
    ) -> ExpressionKind {
        if let Some(def) = ty.struct_def() {
            return match self.struct_values(&def, args, location) {
                Some(values) => ExpressionKind::StructLiteral {
                    ty: ty.clone(),
                    values,
                },
                None => ExpressionKind::Undefined,
            };
        }
        if ty.class_def().is_some() {
            return ExpressionKind::ClassLiteral {
                ty: ty.clone(),
                args,
            };
        }
        match ty.as_base() {
            Some(BaseType::Int | BaseType::Float) => match self.single(ty, args, location) {
                Some(value) => ExpressionKind::TypeCast {
                    ty: ty.clone(),
                    value: value.boxed(),
                },
                None => ExpressionKind::Undefined,
            },
            Some(BaseType::Str) => match self.single(ty, args, location) {
                Some(value) => ExpressionKind::ToString(value.boxed()),
                None => ExpressionKind::Undefined,
            },
            _ => {
                self.sink.error(
                    ErrorCode::E2010,
                    location,
                    format!("type `{ty}` cannot be called"),
                );
                ExpressionKind::Undefined
            }
        }
    }

    /// The one argument of a conversion.
    fn single(
        &mut self,
        ty: &Type,
        args: Vec<LabeledExpression>,
        location: Location,
    ) -> Option<Expression> {
        let count = args.len();
        let mut args = args.into_iter();
        match (args.next(), count) {
            (Some(arg), 1) => Some(arg.value),
            _ => {
                self.sink.error(
                    ErrorCode::E2002,
                    location,
                    format!("conversion to `{ty}` takes 1 argument, found {count}"),
                );
                None
            }
        }
    }

    /// Match arguments to fields: labeled ones by name, the rest by
    /// position.
    fn struct_values(
        &mut self,
        def: &StructDef,
        args: Vec<LabeledExpression>,
        location: Location,
    ) -> Option<Vec<Expression>> {
        let mut slots: Vec<Option<Expression>> = vec![None; def.fields.len()];
        let mut ok = true;
        for (position, arg) in args.into_iter().enumerate() {
            let index = match &arg.label {
                Some(label) => match def.field(label) {
                    Some((index, _)) => index,
                    None => {
                        self.sink.error(
                            ErrorCode::E2005,
                            arg.location,
                            format!("struct `{}` has no field `{label}`", def.id),
                        );
                        ok = false;
                        continue;
                    }
                },
                None if position < slots.len() => position,
                None => {
                    self.sink.error(
                        ErrorCode::E2005,
                        arg.location,
                        format!(
                            "struct `{}` has {} fields, found an extra value",
                            def.id,
                            slots.len()
                        ),
                    );
                    ok = false;
                    continue;
                }
            };
            if slots[index].is_some() {
                self.sink.error(
                    ErrorCode::E2004,
                    arg.location,
                    format!("field `{}` is given more than once", def.fields[index].id),
                );
                ok = false;
                continue;
            }
            slots[index] = Some(arg.value);
        }
        let missing: Vec<&str> = def
            .fields
            .iter()
            .zip(&slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|(field, _)| field.id.name())
            .collect();
        if !missing.is_empty() {
            self.sink.error(
                ErrorCode::E2003,
                location,
                format!("missing fields in `{}`: {}", def.id, missing.join(", ")),
            );
            return None;
        }
        if !ok {
            return None;
        }
        slots.into_iter().collect()
    }

    /// A variant selector used as a value.
    fn bare_variant(&mut self, expression: &mut Expression) {
        let Some((enum_ty, variant)) = self.variant_of(expression) else {
            return;
        };
        let Some(variant) = variant else {
            expression.kind = ExpressionKind::Undefined;
            return;
        };
        if !variant.payload.is_empty() {
            self.sink.error(
                ErrorCode::E2002,
                expression.location,
                format!(
                    "variant `{}` takes {} values, found 0",
                    variant.id,
                    variant.payload.len()
                ),
            );
            expression.kind = ExpressionKind::Undefined;
            return;
        }
        self.constructions += 1;
        expression.kind = ExpressionKind::EnumLiteral {
            enum_ty,
            variant,
            values: Vec::new(),
        };
    }
}

impl VisitorMut for TypeEvaluator {
    fn visit_expression(&mut self, expression: &mut Expression) {
        ensure_sufficient_stack(|| {
            if let ExpressionKind::Call { callee, args } = &mut expression.kind {
                self.visit_callee(callee);
                for arg in args {
                    self.visit_expression(&mut arg.value);
                }
                self.reclassify(expression);
                return;
            }
            let selector = matches!(expression.kind, ExpressionKind::GetAttr { .. });
            walk_expression(self, expression);
            if selector {
                self.bare_variant(expression);
            }
        });
    }

    fn visit_type(&mut self, ty: &mut Type) {
        instantiate(ty);
    }
}
