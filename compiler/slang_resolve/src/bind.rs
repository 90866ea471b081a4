//! Name binding.
//!
//! Resolves every bare name and every piece of type syntax against the
//! scopes filled by [`fill_scopes`](crate::fill_scopes). Scopes carry no
//! parent links; the binder keeps its own stack, pushing a scope when it
//! enters the construct that owns it:
//!
//! ```text
//! base (int, float, str, bool, char)
//!   module
//!     class / struct / enum / interface
//!       function
//!         case arm
//! ```
//!
//! Lookup runs innermost first. A name found in a class or interface scope
//! that denotes a member variable or method is rewritten to `this.name`.
//!
//! Value names become [`ExpressionKind::Ref`]; names of types become
//! [`ExpressionKind::TypeLiteral`]. Type aliases are resolved before
//! anything else, on demand when one alias refers to another, so alias
//! cycles are detected instead of recursing forever.

use std::mem;
use std::rc::Rc;

use rustc_hash::FxHashSet;
use slang_diagnostic::{Diagnostics, DiagnosticSink, ErrorCode};
use slang_ir::defs::TypeDef;
use slang_ir::visitor::{walk_case_arm, walk_definition, walk_expression, VisitorMut};
use slang_ir::{
    CaseArm, Definition, Expression, ExpressionKind, FunctionType, Id, Location, Module, Scope,
    TyCon, Type, TypeExpr, TypeKind,
};
use slang_stack::ensure_sufficient_stack;
use smallvec::smallvec;
use tracing::debug;

use crate::ScopeStack;

/// Resolve every name and type syntax node of `module`.
///
/// `base` is the run's scope of primitive type names. Every successful
/// resolution is appended to `module.references`.
#[tracing::instrument(level = "debug", skip_all, fields(module = %module.name()))]
pub fn bind_names(module: &mut Module, base: &Rc<Scope>) -> Result<(), Diagnostics> {
    let top: ScopeStack = smallvec![Rc::clone(base), Rc::clone(&module.handle.scope)];
    let mut binder = NameBinder {
        sink: DiagnosticSink::new(module.name()),
        scopes: top.clone(),
        top,
        references: Vec::new(),
        resolving: FxHashSet::default(),
        broken: FxHashSet::default(),
    };
    for definition in &module.definitions {
        if let Definition::TypeDef(alias) = definition {
            binder.resolve_alias(alias);
        }
    }
    for definition in &module.definitions {
        binder.visit_definition(definition);
    }
    debug!(references = binder.references.len(), "bound names");
    module.references.append(&mut binder.references);
    binder.sink.finish()
}

struct NameBinder {
    sink: DiagnosticSink,
    /// Active scopes, innermost last.
    scopes: ScopeStack,
    /// Base and module scope, where aliases are resolved.
    top: ScopeStack,
    references: Vec<(Id, Location)>,
    /// Aliases currently being resolved.
    resolving: FxHashSet<Id>,
    /// Aliases that failed; reported once.
    broken: FxHashSet<Id>,
}

impl NameBinder {
    /// Innermost definition of `name`, and whether its scope is a class or
    /// interface body.
    fn lookup(&self, name: &str) -> Option<(Definition, bool)> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.lookup(name).map(|def| (def, scope.is_this_context())))
    }

    fn record(&mut self, definition: &Definition, location: Location) {
        self.references.push((definition.id().clone(), location));
    }

    fn unresolved(&mut self, name: &str, location: Location) {
        self.sink.error(
            ErrorCode::E1002,
            location,
            format!("cannot find `{name}` in this scope"),
        );
    }

    fn with_scope(&mut self, scope: &Rc<Scope>, f: impl FnOnce(&mut Self)) {
        self.scopes.push(Rc::clone(scope));
        f(self);
        self.scopes.pop();
    }

    // Types

    fn resolve_alias(&mut self, alias: &Rc<TypeDef>) {
        let TypeKind::Syntax(expr) = alias.ty.kind().clone() else {
            return;
        };
        if self.broken.contains(&alias.id) {
            return;
        }
        if !self.resolving.insert(alias.id.clone()) {
            self.sink.error(
                ErrorCode::E1004,
                alias.location,
                format!("type alias `{}` refers to itself", alias.id),
            );
            return;
        }
        let scopes = mem::replace(&mut self.scopes, self.top.clone());
        let resolved = self.resolve_type_expr(&expr);
        self.scopes = scopes;
        self.resolving.remove(&alias.id);
        match resolved {
            Some(kind) => alias.ty.set(kind),
            None => {
                self.broken.insert(alias.id.clone());
            }
        }
    }

    /// Replace type syntax inside `ty`, including syntax nested in
    /// composite types built directly by the builder.
    fn resolve_type(&mut self, ty: &Type) {
        ensure_sufficient_stack(|| {
            let kind = ty.kind().clone();
            match kind {
                TypeKind::Syntax(expr) => {
                    if let Some(kind) = self.resolve_type_expr(&expr) {
                        ty.set(kind);
                    }
                }
                TypeKind::App { args, .. } => args.iter().for_each(|arg| self.resolve_type(arg)),
                TypeKind::Function(signature) => {
                    for param in &signature.params {
                        self.resolve_type(param);
                    }
                    self.resolve_type(&signature.ret);
                    self.resolve_type(&signature.except);
                }
                TypeKind::Array { element, .. } | TypeKind::Pointer(element) => {
                    self.resolve_type(&element);
                }
                TypeKind::Meta {
                    resolved: Some(target),
                    ..
                } => self.resolve_type(&target),
                TypeKind::Base(_)
                | TypeKind::Meta { resolved: None, .. }
                | TypeKind::Param(_)
                | TypeKind::Unapplied(_)
                | TypeKind::Unreachable
                | TypeKind::Void => {}
            }
        });
    }

    fn resolve_type_expr(&mut self, expr: &TypeExpr) -> Option<TypeKind> {
        match expr {
            TypeExpr::Name { name, location } => {
                let definition = self.type_name(name, *location)?;
                self.type_of(&definition, *location)
            }
            TypeExpr::Member {
                base,
                name,
                location,
            } => {
                let definition = self.module_member(base, name, *location)?;
                self.type_of(&definition, *location)
            }
            TypeExpr::Apply {
                base,
                args,
                location,
            } => {
                let definition = match base.as_ref() {
                    TypeExpr::Name { name, location } => self.type_name(name, *location)?,
                    TypeExpr::Member {
                        base,
                        name,
                        location,
                    } => self.module_member(base, name, *location)?,
                    other => {
                        self.sink.error(
                            ErrorCode::E1004,
                            *location,
                            format!("`{other}` cannot take type arguments"),
                        );
                        return None;
                    }
                };
                let tycon = self.constructor_of(&definition, *location)?;
                let args = args
                    .iter()
                    .map(|arg| self.resolve_type_expr(arg).map(Type::new))
                    .collect::<Option<Vec<_>>>()?;
                self.apply(&tycon, args, *location)
            }
            TypeExpr::Array { element, size, .. } => Some(TypeKind::Array {
                size: *size,
                element: Type::new(self.resolve_type_expr(element)?),
            }),
            TypeExpr::Pointer { element, .. } => Some(TypeKind::Pointer(Type::new(
                self.resolve_type_expr(element)?,
            ))),
            TypeExpr::Function { params, ret, .. } => {
                let params = params
                    .iter()
                    .map(|param| self.resolve_type_expr(param).map(Type::new))
                    .collect::<Option<Vec<_>>>()?;
                let ret = match ret {
                    Some(ret) => Type::new(self.resolve_type_expr(ret)?),
                    None => Type::void(),
                };
                Some(TypeKind::Function(FunctionType {
                    param_names: vec![None; params.len()],
                    params,
                    ret,
                    except: Type::void(),
                }))
            }
        }
    }

    fn type_name(&mut self, name: &str, location: Location) -> Option<Definition> {
        let Some((definition, _)) = self.lookup(name) else {
            self.unresolved(name, location);
            return None;
        };
        self.record(&definition, location);
        Some(definition)
    }

    /// `module.name` in type position.
    fn module_member(
        &mut self,
        base: &TypeExpr,
        name: &str,
        location: Location,
    ) -> Option<Definition> {
        let TypeExpr::Name {
            name: module,
            location: module_location,
        } = base
        else {
            self.sink.error(
                ErrorCode::E1004,
                location,
                format!("`{base}` is not a module"),
            );
            return None;
        };
        let Definition::Module(handle) = self.type_name(module, *module_location)? else {
            self.sink.error(
                ErrorCode::E1004,
                *module_location,
                format!("`{module}` is not a module"),
            );
            return None;
        };
        let Some(definition) = handle.scope.lookup(name) else {
            self.sink.error(
                ErrorCode::E1002,
                location,
                format!("module `{module}` has no member `{name}`"),
            );
            return None;
        };
        self.record(&definition, location);
        Some(definition)
    }

    /// The type a definition denotes in type position.
    fn type_of(&mut self, definition: &Definition, location: Location) -> Option<TypeKind> {
        match definition {
            Definition::TypeDef(alias) => {
                self.resolve_alias(alias);
                match &*alias.ty.kind() {
                    TypeKind::Syntax(_) => None,
                    kind => Some(kind.clone()),
                }
            }
            Definition::TypeParameter(param) => Some(TypeKind::Param(Rc::clone(param))),
            _ => match definition.tycon() {
                Some(tycon) if tycon.is_generic() => Some(TypeKind::Unapplied(tycon)),
                Some(tycon) => Some(TypeKind::App {
                    tycon,
                    args: Vec::new(),
                }),
                None => {
                    self.sink.error(
                        ErrorCode::E1004,
                        location,
                        format!(
                            "`{}` is a {}, not a type",
                            definition.name(),
                            definition.describe()
                        ),
                    );
                    None
                }
            },
        }
    }

    /// The type constructor behind a definition, seeing through aliases of
    /// unapplied constructors.
    fn constructor_of(&mut self, definition: &Definition, location: Location) -> Option<TyCon> {
        if let Some(tycon) = definition.tycon() {
            return Some(tycon);
        }
        if let Definition::TypeDef(alias) = definition {
            self.resolve_alias(alias);
            if let TypeKind::Unapplied(tycon) = &*alias.ty.kind() {
                return Some(tycon.clone());
            }
        }
        self.sink.error(
            ErrorCode::E1004,
            location,
            format!("`{}` does not take type arguments", definition.name()),
        );
        None
    }

    fn apply(&mut self, tycon: &TyCon, args: Vec<Type>, location: Location) -> Option<TypeKind> {
        let expected = tycon.type_parameters().len();
        if args.len() != expected {
            self.sink.error(
                ErrorCode::E1004,
                location,
                format!(
                    "`{}` expects {expected} type arguments, found {}",
                    tycon.name(),
                    args.len()
                ),
            );
            return None;
        }
        Some(TypeKind::App {
            tycon: tycon.clone(),
            args,
        })
    }

    // Expressions

    fn resolve_name(&mut self, name: &str, location: Location) -> ExpressionKind {
        let Some((definition, this_context)) = self.lookup(name) else {
            self.unresolved(name, location);
            return ExpressionKind::Undefined;
        };
        self.record(&definition, location);
        let member = matches!(definition, Definition::VarDef(_) | Definition::Function(_));
        if this_context && member {
            return match self.lookup("this") {
                Some((this @ Definition::Parameter(_), _)) => ExpressionKind::GetAttr {
                    base: Expression::new(ExpressionKind::Ref(this), location).boxed(),
                    attr: name.to_owned(),
                },
                _ => {
                    self.sink.error(
                        ErrorCode::E1002,
                        location,
                        format!("member `{name}` used where no `this` is available"),
                    );
                    ExpressionKind::Undefined
                }
            };
        }
        self.value_of(definition, location)
    }

    /// Expression form of a resolved definition.
    fn value_of(&mut self, definition: Definition, location: Location) -> ExpressionKind {
        match definition {
            Definition::Struct(_)
            | Definition::Enum(_)
            | Definition::Class(_)
            | Definition::Interface(_)
            | Definition::TypeParameter(_)
            | Definition::TypeDef(_) => match self.type_of(&definition, location) {
                Some(kind) => ExpressionKind::TypeLiteral(Type::new(kind)),
                None => ExpressionKind::Undefined,
            },
            other => ExpressionKind::Ref(other),
        }
    }

    /// `module.attr`, resolved against the module's own scope.
    fn resolve_module_member(&mut self, expression: &mut Expression) {
        let ExpressionKind::GetAttr { base, attr } = &expression.kind else {
            return;
        };
        let ExpressionKind::Ref(Definition::Module(handle)) = &base.kind else {
            return;
        };
        let location = expression.location;
        let kind = match handle.scope.lookup(attr) {
            Some(definition) => {
                self.record(&definition, location);
                self.value_of(definition, location)
            }
            None => {
                self.sink.error(
                    ErrorCode::E1002,
                    location,
                    format!("module `{}` has no member `{attr}`", handle.id),
                );
                ExpressionKind::Undefined
            }
        };
        expression.kind = kind;
    }

    /// `Constructor[T, U]` in expression position.
    fn apply_type_literal(&mut self, expression: &mut Expression) {
        let ExpressionKind::GetIndex { base, indices } = &expression.kind else {
            return;
        };
        let ExpressionKind::TypeLiteral(base_ty) = &base.kind else {
            return;
        };
        let TypeKind::Unapplied(tycon) = base_ty.kind().clone() else {
            return;
        };
        let args: Option<Vec<Type>> = indices
            .iter()
            .map(|index| match &index.kind {
                ExpressionKind::TypeLiteral(ty) => Some(ty.clone()),
                _ => None,
            })
            .collect();
        let Some(args) = args else {
            self.sink.error(
                ErrorCode::E1004,
                expression.location,
                format!("type arguments of `{}` must be types", tycon.name()),
            );
            expression.kind = ExpressionKind::Undefined;
            return;
        };
        expression.kind = match self.apply(&tycon, args, expression.location) {
            Some(kind) => ExpressionKind::TypeLiteral(Type::new(kind)),
            None => ExpressionKind::Undefined,
        };
    }
}

impl VisitorMut for NameBinder {
    fn visit_definition(&mut self, definition: &Definition) {
        match definition {
            Definition::TypeDef(alias) => self.resolve_alias(alias),
            _ => match definition.scope().cloned() {
                Some(scope) => {
                    self.with_scope(&scope, |binder| walk_definition(binder, definition));
                }
                None => walk_definition(self, definition),
            },
        }
    }

    fn visit_case_arm(&mut self, arm: &mut CaseArm) {
        let scope = Rc::clone(&arm.scope);
        self.with_scope(&scope, |binder| walk_case_arm(binder, arm));
    }

    fn visit_expression(&mut self, expression: &mut Expression) {
        if let ExpressionKind::Name(name) = &expression.kind {
            let name = name.clone();
            expression.kind = self.resolve_name(&name, expression.location);
            return;
        }
        walk_expression(self, expression);
        match &expression.kind {
            ExpressionKind::GetAttr { .. } => self.resolve_module_member(expression),
            ExpressionKind::GetIndex { .. } => self.apply_type_literal(expression),
            _ => {}
        }
    }

    fn visit_type(&mut self, ty: &mut Type) {
        self.resolve_type(ty);
    }
}
