//! Helpers shared by the pipeline tests.

use std::rc::Rc;

use slang_compiler::{CompileConfig, CompileError};
use slang_ir::defs::FunctionDef;
use slang_ir::visitor::{walk_expression, walk_statement, VisitorMut};
use slang_ir::{Definition, Expression, IdGen, Module, Statement, StatementKind, Type};

/// `slang_compiler::compile` with `RUST_LOG` output enabled.
pub fn compile(
    ids: &IdGen,
    modules: Vec<Module>,
    config: &CompileConfig,
) -> Result<Vec<Module>, CompileError> {
    slang_compiler::init_tracing();
    slang_compiler::compile(ids, modules, config)
}

/// Function `name` of any module.
pub fn function(modules: &[Module], name: &str) -> Rc<FunctionDef> {
    modules
        .iter()
        .find_map(|module| match module.definition(name) {
            Some(Definition::Function(function)) => Some(Rc::clone(function)),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no function `{name}`"))
}

/// Every statement of `function` that `matches`, outermost first.
pub fn statements(
    function: &FunctionDef,
    matches: impl FnMut(&StatementKind) -> bool,
) -> Vec<Statement> {
    let mut finder = Finder {
        matches,
        found: Vec::new(),
    };
    finder.visit_statement(&mut function.body.borrow_mut());
    finder.found
}

/// Value bound by the first `let name = ..` in `function`.
pub fn let_value(function: &FunctionDef, name: &str) -> Expression {
    let found = statements(function, |kind| {
        matches!(kind, StatementKind::Let { variable, .. } if variable.id.name() == name)
    });
    match found.into_iter().next().map(|statement| statement.kind) {
        Some(StatementKind::Let { value, .. }) => value,
        _ => panic!("no `let {name}` in `{}`", function.id),
    }
}

struct Finder<F> {
    matches: F,
    found: Vec<Statement>,
}

impl<F: FnMut(&StatementKind) -> bool> VisitorMut for Finder<F> {
    fn visit_statement(&mut self, statement: &mut Statement) {
        if (self.matches)(&statement.kind) {
            self.found.push(statement.clone());
        }
        walk_statement(self, statement);
    }
}

/// Node kinds and types of `function`'s body, in visiting order.
///
/// Two bodies with the same shape hold the same constructs with the same
/// types; identities and locations are ignored.
pub fn shape(function: &FunctionDef) -> Vec<String> {
    let mut recorder = Shape(Vec::new());
    recorder.visit_statement(&mut function.body.borrow_mut());
    recorder.0
}

struct Shape(Vec<String>);

impl VisitorMut for Shape {
    fn visit_statement(&mut self, statement: &mut Statement) {
        self.0.push(format!("{:?}", std::mem::discriminant(&statement.kind)));
        walk_statement(self, statement);
    }

    fn visit_expression(&mut self, expression: &mut Expression) {
        self.0.push(format!("{:?}", std::mem::discriminant(&expression.kind)));
        walk_expression(self, expression);
    }

    fn visit_type(&mut self, ty: &mut Type) {
        self.0.push(ty.to_string());
    }
}
