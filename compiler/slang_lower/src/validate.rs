//! Backend contract check.
//!
//! Fully lowered modules contain structs, functions, extern functions,
//! aliases and module references only; statements and expressions are
//! limited to the constructs the backends translate; every type is concrete.
//! [`validate`] reports each leftover as `E3002`.

use rustc_hash::FxHashSet;
use slang_diagnostic::{DiagnosticSink, Diagnostics, ErrorCode};
use slang_ir::visitor::{walk_definition, walk_expression, walk_statement, VisitorMut};
use slang_ir::{
    Definition, Expression, ExpressionKind, Location, Module, Statement, StatementKind, TyCon,
    Type, TypeKind,
};
use slang_stack::ensure_sufficient_stack;

/// Check that `modules` contain nothing the backends cannot translate.
#[tracing::instrument(level = "debug", skip_all, fields(modules = modules.len()))]
pub fn validate(modules: &[Module]) -> Result<(), Diagnostics> {
    let mut errors = Diagnostics::default();
    for module in modules {
        let mut validator = Validator {
            sink: DiagnosticSink::new(module.name()),
            location: Location::GENERATED,
            seen: FxHashSet::default(),
        };
        for definition in &module.definitions {
            validator.visit_definition(definition);
        }
        if let Err(diagnostics) = validator.sink.finish() {
            errors.extend(diagnostics);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

struct Validator {
    sink: DiagnosticSink,
    /// Location of the innermost node being checked, for type reports.
    location: Location,
    /// Type cells already checked.
    seen: FxHashSet<usize>,
}

impl Validator {
    fn leftover(&mut self, location: Location, what: impl Into<String>) {
        self.sink.error(ErrorCode::E3002, location, what);
    }
}

/// Description of the first construct in `ty` that has no backend form.
fn leftover_type(ty: &Type) -> Option<String> {
    ensure_sufficient_stack(|| match &*ty.kind() {
        TypeKind::Meta { resolved: None, .. } => Some(format!("undetermined type `{ty}`")),
        TypeKind::Meta {
            resolved: Some(target),
            ..
        } => leftover_type(target),
        TypeKind::Unapplied(tycon) => Some(format!("unapplied type `{}`", tycon.name())),
        TypeKind::Syntax(expr) => Some(format!("unevaluated type `{expr}`")),
        TypeKind::App { tycon, args } => match tycon {
            TyCon::Struct(def) if def.is_union => Some(format!("union type `{ty}`")),
            TyCon::Struct(_) => args.iter().find_map(leftover_type),
            TyCon::Enum(_) => Some(format!("enum type `{ty}`")),
            TyCon::Class(_) => Some(format!("class type `{ty}`")),
            TyCon::Interface(_) => Some(format!("interface type `{ty}`")),
        },
        TypeKind::Function(signature) => signature
            .params
            .iter()
            .chain([&signature.ret, &signature.except])
            .find_map(leftover_type),
        TypeKind::Array { element, .. } | TypeKind::Pointer(element) => leftover_type(element),
        TypeKind::Base(_)
        | TypeKind::Param(_)
        | TypeKind::Unreachable
        | TypeKind::Void => None,
    })
}

impl VisitorMut for Validator {
    fn visit_definition(&mut self, definition: &Definition) {
        self.sink.begin_definition();
        self.location = definition.location();
        match definition {
            Definition::Class(_) | Definition::Enum(_) | Definition::Interface(_) => {
                let what = format!("{} `{}`", definition.describe(), definition.name());
                self.leftover(definition.location(), what);
                return;
            }
            Definition::Struct(def) if def.is_union => {
                self.leftover(def.location, format!("union `{}`", def.id));
                return;
            }
            _ => {}
        }
        walk_definition(self, definition);
    }

    fn visit_statement(&mut self, statement: &mut Statement) {
        let what = match &statement.kind {
            StatementKind::For { .. } => Some("for-loop"),
            StatementKind::Loop { .. } => Some("loop"),
            StatementKind::Switch { .. } => Some("switch"),
            StatementKind::Case { .. } => Some("case"),
            _ => None,
        };
        if let Some(what) = what {
            self.leftover(statement.location, what);
        }
        self.location = statement.location;
        walk_statement(self, statement);
    }

    fn visit_expression(&mut self, expression: &mut Expression) {
        let what = match &expression.kind {
            ExpressionKind::Undefined | ExpressionKind::Name(_) => Some("unresolved name"),
            ExpressionKind::TypeLiteral(_) => Some("type used as a value"),
            ExpressionKind::VariantRef { .. } | ExpressionKind::EnumLiteral { .. } => {
                Some("enum construction")
            }
            ExpressionKind::ClassLiteral { .. } => Some("class construction"),
            ExpressionKind::UnionLiteral { .. } => Some("union construction"),
            _ => None,
        };
        if let Some(what) = what {
            self.leftover(expression.location, what);
        }
        self.location = expression.location;
        walk_expression(self, expression);
    }

    fn visit_type(&mut self, ty: &mut Type) {
        if !self.seen.insert(ty.cell_address()) {
            return;
        }
        if let Some(what) = leftover_type(ty) {
            self.sink.error_once(ErrorCode::E3002, self.location, what);
        }
    }
}
