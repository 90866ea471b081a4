//! Front end plus lowering for phase tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::rc::Rc;

use slang_diagnostic::Diagnostics;
use slang_ir::defs::FunctionDef;
use slang_ir::visitor::{walk_statement, VisitorMut};
use slang_ir::{Definition, Expression, IdGen, Module, Scope, Statement, StatementKind};
use slang_resolve::{bind_names, evaluate_types, fill_scopes, ModuleMap};
use slang_types::check_module;

use crate::{lower_phase, runtime_module, LoweringContext, Phase, Runtime};

/// Run the front end on `modules`, in order, after the runtime module.
///
/// The runtime module is the first module of the result.
pub(crate) fn check(ids: &IdGen, modules: Vec<Module>) -> Result<Vec<Module>, Diagnostics> {
    let base = Scope::base(ids);
    let mut done = ModuleMap::default();
    let mut all = vec![runtime_module(ids)];
    all.extend(modules);
    for module in &mut all {
        fill_scopes(module, ids, &done)?;
        bind_names(module, &base)?;
        evaluate_types(module)?;
        check_module(module)?;
        done.insert(module.name().to_owned(), Rc::clone(&module.handle));
    }
    Ok(all)
}

/// Check `modules`, then lower them through `last`, re-checking after
/// every phase.
pub(crate) fn try_lower(
    ids: &IdGen,
    modules: Vec<Module>,
    last: Phase,
) -> Result<Vec<Module>, Diagnostics> {
    let mut all = check(ids, modules)?;
    let runtime = Runtime::from_module(&all[0]).expect("runtime builtins");
    let mut cx = LoweringContext::new(ids, runtime);
    for phase in Phase::ALL.into_iter().take_while(|phase| *phase <= last) {
        lower_phase(phase, &mut all, &mut cx)?;
        for module in &all {
            check_module(module)?;
        }
    }
    Ok(all)
}

pub(crate) fn lower(ids: &IdGen, modules: Vec<Module>, last: Phase) -> Vec<Module> {
    try_lower(ids, modules, last)
        .unwrap_or_else(|errors| panic!("lowering failed: {:?}", errors.codes()))
}

/// Function `name` of any module.
pub(crate) fn function(modules: &[Module], name: &str) -> Rc<FunctionDef> {
    modules
        .iter()
        .find_map(|module| match module.definition(name) {
            Some(Definition::Function(function)) => Some(Rc::clone(function)),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no function `{name}`"))
}

/// Definition names of `module`, in order.
pub(crate) fn names(module: &Module) -> Vec<String> {
    module
        .definitions
        .iter()
        .map(|definition| definition.name().to_owned())
        .collect()
}

/// Value bound by the first `let name = ..` in `function`.
pub(crate) fn let_value(function: &FunctionDef, name: &str) -> Expression {
    let found = statements(function, |kind| {
        matches!(kind, StatementKind::Let { variable, .. } if variable.id.name() == name)
    });
    match found.into_iter().next().map(|statement| statement.kind) {
        Some(StatementKind::Let { value, .. }) => value,
        _ => panic!("no `let {name}` in `{}`", function.id),
    }
}

/// Every statement of `function` that `matches`, outermost first.
pub(crate) fn statements(
    function: &FunctionDef,
    matches: impl FnMut(&StatementKind) -> bool,
) -> Vec<Statement> {
    let mut finder = Statements {
        matches,
        found: Vec::new(),
    };
    finder.visit_statement(&mut function.body.borrow_mut());
    finder.found
}

struct Statements<F> {
    matches: F,
    found: Vec<Statement>,
}

impl<F: FnMut(&StatementKind) -> bool> VisitorMut for Statements<F> {
    fn visit_statement(&mut self, statement: &mut Statement) {
        if (self.matches)(&statement.kind) {
            self.found.push(statement.clone());
        }
        walk_statement(self, statement);
    }
}
