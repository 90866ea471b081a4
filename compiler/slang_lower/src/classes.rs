//! Class lowering.
//!
//! ```text
//! class Counter[T] {            struct Counter[T1] { label: T1 }
//!     label: T
//!     step: int = 1             fn Counter_ctor[T2](label: T2) -> Counter[T2] {
//!                                   return Counter[T2] { label }
//!     fn bump(n: int) -> int {  }
//!         n + step
//!     }                         fn Counter_bump[T3](this: Counter[T3], n: int) -> int {
//! }                                 n + 1
//!                               }
//! ```
//!
//! Member variables without a default are stored in the struct. Defaulted
//! member variables are per-class constants: every read is replaced by a copy
//! of the initializer. The checker has already rejected assignments to them.
//! Each generated function gets its own copy of the class type parameters.
//!
//! Uses are rewritten across all modules:
//!
//! | Before | After |
//! |--------|-------|
//! | `Counter(label: x)` | `Counter_ctor(label: x)` |
//! | `c.bump(2)` | `Counter_bump(c, 2)` |
//! | `c.step` | initializer of `step` |
//!
//! Interfaces only constrain types structurally and are dropped. A method
//! referenced without being called has no lowering.

use std::mem;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use slang_diagnostic::{DiagnosticSink, Diagnostics, ErrorCode};
use slang_ir::build::Builder;
use slang_ir::defs::{ClassDef, FunctionDef, Parameter, StructDef, TypeParameter};
use slang_ir::visitor::{walk_expression, VisitorMut};
use slang_ir::{Definition, Expression, ExpressionKind, Id, Location, Module, TyCon, Type, TypeKind};
use slang_stack::ensure_sufficient_stack;
use slang_types::{subst, Substitution};
use tracing::{debug, trace};

use crate::context::LoweringContext;
use crate::for_each_module;
use crate::retype::{applied, mirror, TypeSwap};

/// The struct and functions replacing one class.
pub(crate) struct ClassLayout {
    pub(crate) layout: Rc<StructDef>,
    pub(crate) constructor: Rc<FunctionDef>,
    /// Lifted methods by method name.
    pub(crate) methods: FxHashMap<String, Rc<FunctionDef>>,
    /// Initializers of defaulted member variables by name.
    pub(crate) constants: FxHashMap<String, Expression>,
}

pub(crate) fn lower_classes(
    modules: &mut [Module],
    cx: &mut LoweringContext<'_>,
) -> Result<(), Diagnostics> {
    for module in modules.iter_mut() {
        layout_module(module, cx);
    }
    let cx = &*cx;
    for_each_module(modules, |module| rewrite_uses(module, cx))?;
    let swapped = TypeSwap::new(|ty: &Type| struct_type(ty, &cx.classes)).modules(modules);
    debug!(classes = cx.classes.len(), swapped, "lowered classes");
    Ok(())
}

fn layout_module(module: &mut Module, cx: &mut LoweringContext<'_>) {
    let b = Builder::new(cx.ids);
    let mut definitions = Vec::with_capacity(module.definitions.len());
    for definition in mem::take(&mut module.definitions) {
        match definition {
            Definition::Class(def) => {
                let layout = layout(&b, &def);
                definitions.push(Definition::Struct(Rc::clone(&layout.layout)));
                definitions.push(Definition::Function(Rc::clone(&layout.constructor)));
                for method in &def.methods {
                    if let Some(lifted) = layout.methods.get(method.id.name()) {
                        definitions.push(Definition::Function(Rc::clone(lifted)));
                    }
                }
                cx.classes.insert(def.id.clone(), layout);
            }
            Definition::Interface(def) => trace!(interface = %def.id, "dropping interface"),
            other => definitions.push(other),
        }
    }
    module.definitions = definitions;
}

fn layout(b: &Builder<'_>, def: &Rc<ClassDef>) -> ClassLayout {
    b.located(def.location);
    let name = def.id.name();
    let stored: Vec<_> = def.fields.iter().filter(|field| !field.has_default()).collect();

    let (params, mapping) = mirror(b, &def.type_parameters);
    let fields = stored
        .iter()
        .map(|field| b.field(field.id.name(), subst(&field.ty.borrow(), &mapping)))
        .collect();
    let layout = b.struct_def(name, params, fields);

    let (params, mapping) = mirror(b, &def.type_parameters);
    let args: Vec<Type> = params.iter().map(Type::param).collect();
    let parameters: Vec<Rc<Parameter>> = stored
        .iter()
        .map(|field| b.param(field.id.name(), subst(&field.ty.borrow(), &mapping)))
        .collect();
    let values = parameters
        .iter()
        .map(|param| b.reference(Definition::Parameter(Rc::clone(param))))
        .collect();
    let literal = Expression::new(
        ExpressionKind::StructLiteral {
            ty: applied(&layout, args.clone()),
            values,
        },
        def.location,
    );
    let constructor = b.function(
        &format!("{name}_ctor"),
        params,
        parameters,
        Some(applied(&layout, args)),
        b.return_(Some(literal)),
    );

    let class = TyCon::Class(Rc::clone(def));
    let methods = def
        .methods
        .iter()
        .map(|method| {
            let lifted = lift(b, &class, &def.type_parameters, method);
            (method.id.name().to_owned(), lifted)
        })
        .collect();
    let constants = def
        .fields
        .iter()
        .filter_map(|field| {
            let value = field.value.borrow().clone()?;
            Some((field.id.name().to_owned(), value))
        })
        .collect();
    ClassLayout {
        layout,
        constructor,
        methods,
        constants,
    }
}

/// Move `method` into a free function taking its receiver first.
fn lift(
    b: &Builder<'_>,
    class: &TyCon,
    class_params: &[Rc<TypeParameter>],
    method: &FunctionDef,
) -> Rc<FunctionDef> {
    b.located(method.location);
    let (mut type_parameters, mapping) = mirror(b, class_params);
    let receiver = b.param(
        "this",
        class.apply(type_parameters.iter().map(Type::param).collect()),
    );
    type_parameters.extend(method.type_parameters.iter().cloned());
    let mut parameters = vec![Rc::clone(&receiver)];
    parameters.extend(method.parameters.iter().cloned());
    let body = mem::take(&mut *method.body.borrow_mut());
    let lifted = b.raising_function(
        &format!("{}_{}", class.name(), method.id.name()),
        type_parameters,
        parameters,
        Some(subst(&method.return_ty, &mapping)),
        Some(subst(&method.except_ty, &mapping)),
        body,
    );
    let mut rebase = Rebase {
        mapping,
        receiver: method
            .this_param
            .get()
            .map(|old| (old.id.clone(), Rc::clone(&receiver))),
    };
    rebase.visit_definition(&Definition::Function(Rc::clone(&lifted)));
    lifted
}

/// Moves a method body onto the lifted function's type parameters and
/// receiver.
struct Rebase {
    mapping: Substitution,
    receiver: Option<(Id, Rc<Parameter>)>,
}

impl VisitorMut for Rebase {
    fn visit_expression(&mut self, expression: &mut Expression) {
        if let (ExpressionKind::Ref(Definition::Parameter(param)), Some((old, new))) =
            (&mut expression.kind, &self.receiver)
        {
            if param.id == *old {
                *param = Rc::clone(new);
            }
        }
        walk_expression(self, expression);
    }

    fn visit_type(&mut self, ty: &mut Type) {
        *ty = subst(ty, &self.mapping);
    }
}

/// The layout struct application replacing a class application.
fn struct_type(ty: &Type, classes: &FxHashMap<Id, ClassLayout>) -> Option<TypeKind> {
    match &*ty.kind() {
        TypeKind::App {
            tycon: TyCon::Class(def),
            args,
        } => classes.get(&def.id).map(|layout| TypeKind::App {
            tycon: TyCon::Struct(Rc::clone(&layout.layout)),
            args: args.clone(),
        }),
        _ => None,
    }
}

fn class_of<'m>(
    classes: &'m FxHashMap<Id, ClassLayout>,
    ty: &Type,
) -> Option<(&'m ClassLayout, Rc<ClassDef>)> {
    let def = ty.class_def()?;
    Some((classes.get(&def.id)?, def))
}

fn rewrite_uses(module: &mut Module, cx: &LoweringContext<'_>) -> Result<(), Diagnostics> {
    let mut uses = ClassUses {
        b: Builder::new(cx.ids),
        classes: &cx.classes,
        sink: DiagnosticSink::new(module.name()),
        rewrites: 0,
    };
    for definition in &module.definitions {
        uses.visit_definition(definition);
    }
    debug!(module = %module.name(), rewrites = uses.rewrites, "rewrote class uses");
    uses.sink.finish()
}

struct ClassUses<'a> {
    b: Builder<'a>,
    classes: &'a FxHashMap<Id, ClassLayout>,
    sink: DiagnosticSink,
    rewrites: usize,
}

impl ClassUses<'_> {
    /// Lifted function of `receiver.name(..)`, when `name` is a method.
    fn method(&self, callee: &Expression) -> Option<Rc<FunctionDef>> {
        let ExpressionKind::GetAttr { base, attr } = &callee.kind else {
            return None;
        };
        let (layout, _) = class_of(self.classes, &base.ty)?;
        layout.methods.get(attr).cloned()
    }

    /// `receiver.method(args)` to `Class_method(receiver, args)`.
    fn method_call(&mut self, expression: &mut Expression, lifted: Rc<FunctionDef>) {
        let location = expression.location;
        let ExpressionKind::Call { callee, args } = &mut expression.kind else {
            return;
        };
        let ExpressionKind::GetAttr { base, .. } = &mut callee.kind else {
            return;
        };
        self.visit_expression(base);
        for arg in args.iter_mut() {
            self.visit_expression(&mut arg.value);
        }
        let receiver = mem::take(&mut **base);
        let b = self.b.located(location);
        let mut lowered = vec![b.arg(receiver)];
        lowered.extend(mem::take(args));
        expression.kind = ExpressionKind::Call {
            callee: b.reference(Definition::Function(lifted)).boxed(),
            args: lowered,
        };
        self.rewrites += 1;
    }

    /// Replacement of a member read `receiver.attr`.
    fn member_read(&mut self, base: &Type, attr: &str, location: Location) -> Option<Expression> {
        let (layout, def) = class_of(self.classes, base)?;
        if let Some(value) = layout.constants.get(attr) {
            let mut value = value.clone();
            value.location = location;
            return Some(value);
        }
        if layout.methods.contains_key(attr) {
            self.sink.error(
                ErrorCode::E3002,
                location,
                format!("method `{attr}` of class `{}` is used without being called", def.id),
            );
        }
        None
    }
}

impl VisitorMut for ClassUses<'_> {
    fn visit_expression(&mut self, expression: &mut Expression) {
        ensure_sufficient_stack(|| {
            let lifted = match &expression.kind {
                ExpressionKind::Call { callee, .. } => self.method(callee),
                _ => None,
            };
            if let Some(lifted) = lifted {
                self.method_call(expression, lifted);
                return;
            }
            walk_expression(self, expression);
            let location = expression.location;
            match &mut expression.kind {
                ExpressionKind::ClassLiteral { ty, args } => {
                    let Some((layout, _)) = class_of(self.classes, ty) else {
                        self.sink.error(
                            ErrorCode::E9001,
                            location,
                            format!("literal of `{ty}`, which is not a lowered class"),
                        );
                        return;
                    };
                    let callee = self
                        .b
                        .located(location)
                        .reference(Definition::Function(Rc::clone(&layout.constructor)));
                    let args = mem::take(args);
                    expression.kind = ExpressionKind::Call {
                        callee: callee.boxed(),
                        args,
                    };
                    self.rewrites += 1;
                }
                ExpressionKind::GetAttr { base, attr } => {
                    let base = base.ty.clone();
                    let attr = attr.clone();
                    if let Some(value) = self.member_read(&base, &attr, location) {
                        *expression = value;
                        self.rewrites += 1;
                        // The initializer may construct classes itself.
                        self.visit_expression(expression);
                    }
                }
                _ => {}
            }
        });
    }
}

#[cfg(test)]
mod tests;
