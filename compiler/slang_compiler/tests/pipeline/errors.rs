//! Diagnostics of failed runs and the stage that reports them.

use pretty_assertions::assert_eq;
use slang_compiler::{CompileConfig, CompileError, Phase, Stage};
use slang_diagnostic::ErrorCode;
use slang_ir::build::Builder;
use slang_ir::{Definition, IdGen, Module, Statement, Type};

use crate::common::compile;

fn module_with(b: &Builder<'_>, name: &str, body: Statement, ret: Option<Type>) -> Module {
    let main = b.function("main", vec![], vec![], ret, body);
    let mut module = b.module(name);
    module.add(Definition::Function(main));
    module
}

fn compile_err(ids: &IdGen, modules: Vec<Module>) -> CompileError {
    compile(ids, modules, &CompileConfig::default()).unwrap_err()
}

#[test]
fn unresolved_names_stop_the_front_end() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let module = module_with(&b, "main", b.return_(Some(b.name("missing"))), Some(Type::int()));

    let error = compile_err(&ids, vec![module]);
    assert_eq!(error.stage, Stage::Check);
    assert_eq!(error.diagnostics.codes(), vec![ErrorCode::E1002]);
    assert!(error.to_string().starts_with("checking failed: main:"));
}

#[test]
fn mismatched_return_is_a_unification_error() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let module = module_with(&b, "main", b.return_(Some(b.str_("no"))), Some(Type::int()));

    let error = compile_err(&ids, vec![module]);
    assert_eq!(error.stage, Stage::Check);
    assert_eq!(error.diagnostics.codes(), vec![ErrorCode::E2001]);
}

#[test]
fn every_failing_module_is_reported_and_dependents_are_skipped() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let broken = module_with(&b, "broken", b.return_(Some(b.name("nope"))), Some(Type::int()));
    let other = module_with(&b, "other", b.return_(Some(b.str_("no"))), Some(Type::int()));
    let mut user = module_with(&b, "user", b.return_(Some(b.name("undefined"))), None);
    user.imports.push(b.import("broken"));

    let error = compile_err(&ids, vec![user, broken, other]);
    let modules: Vec<&str> = error.diagnostics.iter().map(|d| d.module.as_str()).collect();
    assert_eq!(modules, vec!["broken", "other"]);
    assert_eq!(
        error.diagnostics.codes(),
        vec![ErrorCode::E1002, ErrorCode::E2001]
    );
}

#[test]
fn import_cycles_fail_before_checking() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let mut a = module_with(&b, "a", b.pass(), None);
    a.imports.push(b.import("b"));
    let mut c = module_with(&b, "b", b.pass(), None);
    c.imports.push(b.import("a"));

    let error = compile_err(&ids, vec![a, c]);
    assert_eq!(error.stage, Stage::Order);
    assert_eq!(error.diagnostics.codes(), vec![ErrorCode::E1005]);
}

/// `class Counter { count: int  step: int = 1  fn bump() }` and a `main`
/// that builds one and then runs `tail` on it as `c`.
fn counter_program(b: &Builder<'_>, tail: Statement) -> Module {
    let bump = b.function("bump", vec![], vec![], None, b.pass());
    let counter = b.class_def(
        "Counter",
        vec![],
        vec![
            b.var_def("count", Type::int(), None),
            b.var_def("step", Type::int(), Some(b.int(1))),
        ],
        vec![bump],
    );
    let c = b.variable("c");
    let body = b.compound(vec![
        b.let_(&c, None, b.call(b.name("Counter"), vec![b.labeled("count", b.int(0))])),
        tail,
    ]);
    let mut module = module_with(b, "main", body, None);
    module.add(Definition::Class(counter));
    module
}

fn method_as_value(b: &Builder<'_>) -> Module {
    let f = b.variable("f");
    counter_program(b, b.let_(&f, None, b.attr(b.name("c"), "bump")))
}

#[test]
fn assigning_a_defaulted_member_fails_checking() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let tail = b.assign(b.attr(b.name("c"), "step"), b.int(2));
    let error = compile_err(&ids, vec![counter_program(&b, tail)]);
    assert_eq!(error.stage, Stage::Check);
    assert_eq!(error.diagnostics.codes(), vec![ErrorCode::E3001]);
}

#[test]
fn lowering_errors_name_their_phase() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let error = compile_err(&ids, vec![method_as_value(&b)]);
    assert_eq!(error.stage, Stage::Lower(Phase::Classes));
    assert_eq!(error.diagnostics.codes(), vec![ErrorCode::E3002]);
    assert!(error.to_string().starts_with("lowering (classes) failed"));
}

#[test]
fn stopping_early_skips_later_phases_and_validation() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let config = CompileConfig {
        stop_after: Some(Phase::Enums),
        ..CompileConfig::default()
    };
    let modules = compile(&ids, vec![method_as_value(&b)], &config).unwrap();
    assert!(matches!(
        modules[1].definition("Counter"),
        Some(Definition::Class(_))
    ));
}
