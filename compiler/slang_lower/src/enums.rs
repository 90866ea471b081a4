//! Enum lowering.
//!
//! Every enum becomes a tagged union: a struct holding the variant index and
//! an untagged union with one member per variant.
//!
//! ```text
//! enum Shape[T] {          struct ShapeCircleData[T] { f_0: T, f_1: T }
//!     Empty                union ShapeData[T] {
//!     Circle(T, T)             Empty: int
//!     Label(str)               Circle: ShapeCircleData[T]
//! }                            Label: str
//!                          }
//!                          struct Shape[T] { tag: int, data: ShapeData[T] }
//! ```
//!
//! Payload-less variants store a dummy `int`, single-value variants store the
//! value itself and multi-value variants store an auxiliary struct. Every
//! generated struct gets its own copy of the enum's type parameters.
//!
//! The phase runs in three steps, each across all modules before the next:
//!
//! 1. **Layout**: replace each enum definition with its generated structs.
//! 2. **Uses**: rewrite `case` statements and enum literals.
//! 3. **Types**: retarget every enum type cell to the tagged struct.
//!
//! ```text
//! case value {                  let scrutinee = value
//!     Circle(x, y): B           switch scrutinee.tag {
//!     else: E                       1: { let x = scrutinee.data.Circle.f_0
//! }                                      let y = scrutinee.data.Circle.f_1
//!                                        B }
//!                                   default: E      (unreachable without else)
//!                               }
//! ```

use std::mem;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use slang_diagnostic::{DiagnosticSink, Diagnostics, ErrorCode};
use slang_ir::build::Builder;
use slang_ir::defs::{EnumDef, EnumVariant, StructDef, Variable};
use slang_ir::visitor::{walk_expression, walk_statement, VisitorMut};
use slang_ir::{
    CaseArm, Definition, Expression, ExpressionKind, Id, Location, Module, Statement,
    StatementKind, TyCon, Type, TypeKind,
};
use slang_types::subst;
use tracing::debug;

use crate::context::LoweringContext;
use crate::for_each_module;
use crate::retype::{applied, mirror, TypeSwap};

/// The structs replacing one enum.
pub(crate) struct EnumLayout {
    pub(crate) tagged: Rc<StructDef>,
    pub(crate) union: Rc<StructDef>,
    /// Auxiliary struct of each variant carrying more than one value, by
    /// variant index.
    pub(crate) payloads: Vec<Option<Rc<StructDef>>>,
}

pub(crate) fn lower_enums(
    modules: &mut [Module],
    cx: &mut LoweringContext<'_>,
) -> Result<(), Diagnostics> {
    for module in modules.iter_mut() {
        layout_module(module, cx);
    }
    let cx = &*cx;
    for_each_module(modules, |module| rewrite_uses(module, cx))?;
    let swapped = TypeSwap::new(|ty: &Type| tagged_type(ty, &cx.enums)).modules(modules);
    debug!(enums = cx.enums.len(), swapped, "lowered enums");
    Ok(())
}

fn layout_module(module: &mut Module, cx: &mut LoweringContext<'_>) {
    let b = Builder::new(cx.ids);
    let mut definitions = Vec::with_capacity(module.definitions.len());
    for definition in mem::take(&mut module.definitions) {
        let def = match definition {
            Definition::Enum(def) => def,
            other => {
                definitions.push(other);
                continue;
            }
        };
        let layout = layout(&b, &def);
        definitions.extend(
            layout
                .payloads
                .iter()
                .flatten()
                .map(|aux| Definition::Struct(Rc::clone(aux))),
        );
        definitions.push(Definition::Struct(Rc::clone(&layout.union)));
        definitions.push(Definition::Struct(Rc::clone(&layout.tagged)));
        cx.enums.insert(def.id.clone(), layout);
    }
    module.definitions = definitions;
}

fn layout(b: &Builder<'_>, def: &EnumDef) -> EnumLayout {
    b.located(def.location);
    let name = def.id.name();
    let payloads: Vec<Option<Rc<StructDef>>> = def
        .variants
        .iter()
        .map(|variant| {
            if variant.payload.len() < 2 {
                return None;
            }
            let (params, mapping) = mirror(b, &def.type_parameters);
            let fields = variant
                .payload
                .iter()
                .enumerate()
                .map(|(i, ty)| b.field(&format!("f_{i}"), subst(ty, &mapping)))
                .collect();
            Some(b.struct_def(&format!("{name}{}Data", variant.id.name()), params, fields))
        })
        .collect();

    let (params, mapping) = mirror(b, &def.type_parameters);
    let args: Vec<Type> = params.iter().map(Type::param).collect();
    let members = def
        .variants
        .iter()
        .zip(&payloads)
        .map(|(variant, aux)| {
            let ty = match (aux, variant.payload.as_slice()) {
                (Some(aux), _) => applied(aux, args.clone()),
                (None, [single]) => subst(single, &mapping),
                (None, _) => Type::int(),
            };
            b.field(variant.id.name(), ty)
        })
        .collect();
    let union = b.union_def(&format!("{name}Data"), params, members);

    let (params, _) = mirror(b, &def.type_parameters);
    let args = params.iter().map(Type::param).collect();
    let fields = vec![
        b.field("tag", Type::int()),
        b.field("data", applied(&union, args)),
    ];
    let tagged = b.struct_def(name, params, fields);
    EnumLayout {
        tagged,
        union,
        payloads,
    }
}

/// The tagged struct application replacing an enum application.
fn tagged_type(ty: &Type, enums: &FxHashMap<Id, EnumLayout>) -> Option<TypeKind> {
    match &*ty.kind() {
        TypeKind::App {
            tycon: TyCon::Enum(def),
            args,
        } => enums.get(&def.id).map(|layout| TypeKind::App {
            tycon: TyCon::Struct(Rc::clone(&layout.tagged)),
            args: args.clone(),
        }),
        _ => None,
    }
}

/// Layout and type arguments of an enum application.
fn layout_of<'m>(
    enums: &'m FxHashMap<Id, EnumLayout>,
    ty: &Type,
) -> Option<(&'m EnumLayout, Vec<Type>)> {
    let (tycon, args) = ty.as_app()?;
    let TyCon::Enum(def) = tycon else {
        return None;
    };
    Some((enums.get(&def.id)?, args))
}

fn tag(variant: &EnumVariant) -> i64 {
    i64::try_from(variant.index).unwrap_or(i64::MAX)
}

fn rewrite_uses(module: &mut Module, cx: &LoweringContext<'_>) -> Result<(), Diagnostics> {
    let mut uses = EnumUses {
        b: Builder::new(cx.ids),
        enums: &cx.enums,
        sink: DiagnosticSink::new(module.name()),
        cases: 0,
        literals: 0,
    };
    for definition in &module.definitions {
        uses.visit_definition(definition);
    }
    debug!(
        module = %module.name(),
        cases = uses.cases,
        literals = uses.literals,
        "rewrote enum uses"
    );
    uses.sink.finish()
}

struct EnumUses<'a> {
    b: Builder<'a>,
    enums: &'a FxHashMap<Id, EnumLayout>,
    sink: DiagnosticSink,
    cases: usize,
    literals: usize,
}

impl EnumUses<'_> {
    fn lower_case(
        &mut self,
        layout: &EnumLayout,
        value: Expression,
        arms: Vec<CaseArm>,
        else_branch: Option<Box<Statement>>,
        location: Location,
    ) -> StatementKind {
        let scrutinee = self.b.located(location).variable("scrutinee");
        let mut switch_arms = Vec::with_capacity(arms.len());
        for arm in arms {
            let Some(variant) = arm.variant else {
                self.sink.error(
                    ErrorCode::E9001,
                    arm.location,
                    format!("case arm `{}` reached lowering unmatched", arm.name),
                );
                continue;
            };
            let b = self.b.located(arm.location);
            let member = || {
                let data = b.attr(b.reference(var(&scrutinee)), "data");
                b.attr(data, variant.id.name())
            };
            let mut body: Vec<Statement> = match arm.variables.as_slice() {
                [single] if layout.payloads[variant.index].is_none() => {
                    vec![b.let_(single, None, member())]
                }
                variables => variables
                    .iter()
                    .enumerate()
                    .map(|(i, variable)| {
                        b.let_(variable, None, b.attr(member(), &format!("f_{i}")))
                    })
                    .collect(),
            };
            body.push(*arm.body);
            switch_arms.push((tag(&variant), b.compound(body)));
        }
        let b = self.b.located(location);
        let default = else_branch.map_or_else(|| b.unreachable(), |branch| *branch);
        self.cases += 1;
        StatementKind::Compound(vec![
            b.let_(&scrutinee, None, value),
            b.switch(
                b.attr(b.reference(var(&scrutinee)), "tag"),
                switch_arms,
                default,
            ),
        ])
    }

    /// `tagged { tag: index, data: union { variant: payload } }`
    fn tagged_literal(
        &mut self,
        layout: &EnumLayout,
        args: Vec<Type>,
        variant: &EnumVariant,
        values: Vec<Expression>,
        location: Location,
    ) -> ExpressionKind {
        let b = self.b.located(location);
        let payload = match &layout.payloads[variant.index] {
            Some(aux) => Expression::new(
                ExpressionKind::StructLiteral {
                    ty: applied(aux, args.clone()),
                    values,
                },
                location,
            ),
            None => values.into_iter().next().unwrap_or_else(|| b.int(0)),
        };
        let data = Expression::new(
            ExpressionKind::UnionLiteral {
                ty: applied(&layout.union, args.clone()),
                field: variant.id.name().to_owned(),
                value: payload.boxed(),
            },
            location,
        );
        self.literals += 1;
        ExpressionKind::StructLiteral {
            ty: applied(&layout.tagged, args),
            values: vec![b.int(tag(variant)), data],
        }
    }
}

fn var(variable: &Rc<Variable>) -> Definition {
    Definition::Variable(Rc::clone(variable))
}

impl VisitorMut for EnumUses<'_> {
    fn visit_statement(&mut self, statement: &mut Statement) {
        walk_statement(self, statement);
        let location = statement.location;
        let StatementKind::Case {
            value,
            arms,
            else_branch,
        } = &mut statement.kind
        else {
            return;
        };
        let Some((layout, _)) = layout_of(self.enums, &value.ty) else {
            self.sink.error(
                ErrorCode::E9001,
                location,
                format!("case over `{}`, which is not a lowered enum", value.ty),
            );
            return;
        };
        let value = mem::take(value);
        let arms = mem::take(arms);
        let else_branch = else_branch.take();
        statement.kind = self.lower_case(layout, value, arms, else_branch, location);
    }

    fn visit_expression(&mut self, expression: &mut Expression) {
        walk_expression(self, expression);
        let location = expression.location;
        let ExpressionKind::EnumLiteral {
            enum_ty,
            variant,
            values,
        } = &mut expression.kind
        else {
            return;
        };
        let Some((layout, args)) = layout_of(self.enums, enum_ty) else {
            self.sink.error(
                ErrorCode::E9001,
                location,
                format!("literal of `{enum_ty}`, which is not a lowered enum"),
            );
            return;
        };
        let variant = Rc::clone(variant);
        let values = mem::take(values);
        expression.kind = self.tagged_literal(layout, args, &variant, values, location);
    }
}

#[cfg(test)]
mod tests;
