//! Scope filling.
//!
//! Registers declarations into the scopes the builder created empty:
//!
//! | Scope owner | Registered names |
//! |-------------|------------------|
//! | module | imports, top-level definitions |
//! | struct | type parameters, fields |
//! | enum | type parameters, variants |
//! | class | type parameters, member variables, methods |
//! | interface | type parameters, method declarations |
//! | function | type parameters, `this`, parameters, let/for/try variables |
//! | case arm | arm variables, lets inside the arm |
//!
//! Methods get their receiver here: a `this` parameter typed as the class
//! applied to its own type parameters.

use std::rc::Rc;

use slang_diagnostic::{Diagnostics, DiagnosticSink, ErrorCode};
use slang_ir::defs::{ClassDef, FunctionDef, Parameter, TypeParameter};
use slang_ir::visitor::{walk_case_arm, walk_statement, VisitorMut};
use slang_ir::{
    CaseArm, Definition, Expression, IdGen, ImportKind, Location, Module, Scope, Statement,
    StatementKind, TyCon, Type,
};
use tracing::{debug, trace};

use crate::{ModuleMap, ScopeStack};

/// Populate every scope of `module`.
///
/// `done` holds the modules already through the front end; imports of
/// anything else are reported.
#[tracing::instrument(level = "debug", skip_all, fields(module = %module.name()))]
pub fn fill_scopes(module: &Module, ids: &IdGen, done: &ModuleMap) -> Result<(), Diagnostics> {
    let mut filler = ScopeFiller {
        sink: DiagnosticSink::new(module.name()),
        ids,
        scopes: ScopeStack::new(),
    };
    let scope = Rc::clone(&module.handle.scope);
    filler.bind_imports(module, &scope, done);
    filler.declare_all(&scope, module.definitions.iter().cloned());
    filler.scopes.push(scope);
    for definition in &module.definitions {
        filler.visit_definition(definition);
    }
    debug!(symbols = module.handle.scope.len(), "filled module scope");
    filler.sink.finish()
}

struct ScopeFiller<'a> {
    sink: DiagnosticSink,
    ids: &'a IdGen,
    scopes: ScopeStack,
}

impl ScopeFiller<'_> {
    fn define(&mut self, scope: &Scope, name: &str, definition: Definition, location: Location) {
        if let Err(existing) = scope.define(name, definition) {
            self.sink.error(
                ErrorCode::E1001,
                location,
                format!(
                    "`{name}` is already defined as a {} at {}",
                    existing.describe(),
                    existing.location()
                ),
            );
        }
    }

    fn declare(&mut self, scope: &Scope, definition: Definition) {
        let name = definition.name().to_owned();
        let location = definition.location();
        self.define(scope, &name, definition, location);
    }

    fn declare_all(&mut self, scope: &Scope, definitions: impl IntoIterator<Item = Definition>) {
        for definition in definitions {
            self.declare(scope, definition);
        }
    }

    /// Declare in the innermost active scope.
    fn declare_here(&mut self, definition: Definition) {
        if let Some(scope) = self.scopes.last().cloned() {
            self.declare(&scope, definition);
        }
    }

    fn bind_imports(&mut self, module: &Module, scope: &Scope, done: &ModuleMap) {
        for import in &module.imports {
            let Some(target) = done.get(&import.module) else {
                self.sink.error(
                    ErrorCode::E1003,
                    import.location,
                    format!("no module named `{}`", import.module),
                );
                continue;
            };
            match &import.kind {
                ImportKind::Module => {
                    self.define(
                        scope,
                        &import.module,
                        Definition::Module(Rc::clone(target)),
                        import.location,
                    );
                }
                ImportKind::Names(names) => {
                    for (name, location) in names {
                        match target.scope.lookup(name) {
                            Some(definition) => self.define(scope, name, definition, *location),
                            None => self.sink.error(
                                ErrorCode::E1003,
                                *location,
                                format!("module `{}` has no member `{name}`", import.module),
                            ),
                        }
                    }
                }
            }
        }
    }

    fn fill_function(&mut self, function: &FunctionDef, owner: Option<&Rc<ClassDef>>) {
        trace!(function = %function.id, "filling function scope");
        let scope = Rc::clone(&function.scope);
        self.declare_all(&scope, type_parameters(&function.type_parameters));
        if let Some(class) = owner {
            let this = function.this_param.get_or_init(|| {
                let args = class.type_parameters.iter().map(Type::param).collect();
                Rc::new(Parameter {
                    id: self.ids.fresh("this"),
                    location: function.location,
                    ty: TyCon::Class(Rc::clone(class)).apply(args).into(),
                })
            });
            self.declare(&scope, Definition::Parameter(Rc::clone(this)));
        }
        self.declare_all(
            &scope,
            function.parameters.iter().cloned().map(Definition::Parameter),
        );
        self.scopes.push(scope);
        self.visit_statement(&mut function.body.borrow_mut());
        self.scopes.pop();
    }

    fn fill_class(&mut self, class: &Rc<ClassDef>) {
        let scope = Rc::clone(&class.scope);
        self.declare_all(&scope, type_parameters(&class.type_parameters));
        self.declare_all(&scope, class.fields.iter().cloned().map(Definition::VarDef));
        self.declare_all(&scope, class.methods.iter().cloned().map(Definition::Function));
        self.scopes.push(scope);
        for method in &class.methods {
            self.fill_function(method, Some(class));
        }
        self.scopes.pop();
    }
}

impl VisitorMut for ScopeFiller<'_> {
    fn visit_definition(&mut self, definition: &Definition) {
        match definition {
            Definition::Function(function) => self.fill_function(function, None),
            Definition::Class(class) => self.fill_class(class),
            Definition::Struct(def) => {
                self.declare_all(&def.scope, type_parameters(&def.type_parameters));
                self.declare_all(&def.scope, def.fields.iter().cloned().map(Definition::Field));
            }
            Definition::Enum(def) => {
                self.declare_all(&def.scope, type_parameters(&def.type_parameters));
                self.declare_all(
                    &def.scope,
                    def.variants.iter().cloned().map(Definition::EnumVariant),
                );
            }
            Definition::Interface(def) => {
                self.declare_all(&def.scope, type_parameters(&def.type_parameters));
                self.declare_all(
                    &def.scope,
                    def.methods.iter().cloned().map(Definition::FunctionDecl),
                );
            }
            Definition::Module(_)
            | Definition::ExternFunction(_)
            | Definition::FunctionDecl(_)
            | Definition::Variable(_)
            | Definition::Parameter(_)
            | Definition::VarDef(_)
            | Definition::TypeDef(_)
            | Definition::TypeParameter(_)
            | Definition::EnumVariant(_)
            | Definition::Field(_) => {}
        }
    }

    fn visit_statement(&mut self, statement: &mut Statement) {
        match &statement.kind {
            StatementKind::Let { variable, .. }
            | StatementKind::For { variable, .. }
            | StatementKind::Try { variable, .. } => {
                self.declare_here(Definition::Variable(Rc::clone(variable)));
            }
            _ => {}
        }
        walk_statement(self, statement);
    }

    fn visit_case_arm(&mut self, arm: &mut CaseArm) {
        self.declare_all(&arm.scope, arm.variables.iter().cloned().map(Definition::Variable));
        self.scopes.push(Rc::clone(&arm.scope));
        walk_case_arm(self, arm);
        self.scopes.pop();
    }

    // Expressions declare nothing.
    fn visit_expression(&mut self, _expression: &mut Expression) {}
}

fn type_parameters(params: &[Rc<TypeParameter>]) -> impl Iterator<Item = Definition> + '_ {
    params.iter().cloned().map(Definition::TypeParameter)
}
