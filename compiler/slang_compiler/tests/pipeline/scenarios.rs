//! Whole programs through the front end and the lowering pipeline.

use std::rc::Rc;

use pretty_assertions::assert_eq;
use slang_compiler::{check, CompileConfig, Phase};
use slang_ir::build::Builder;
use slang_ir::{
    BinaryOp, Definition, ExpressionKind, IdGen, Module, Statement, StatementKind, Type,
};

use crate::common::{compile, function, let_value, shape, statements};

fn stop_after(phase: Phase) -> CompileConfig {
    CompileConfig {
        stop_after: Some(phase),
        ..CompileConfig::default()
    }
}

fn main_module(b: &Builder<'_>, definitions: Vec<Definition>) -> Module {
    let mut module = b.module("main");
    for definition in definitions {
        module.add(definition);
    }
    module
}

#[test]
fn struct_construction_follows_declaration_order() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let point = b.struct_def(
        "Point",
        vec![],
        vec![b.field("x", Type::int()), b.field("y", Type::int())],
    );
    let p = b.variable("p");
    let body = b.compound(vec![
        b.let_(
            &p,
            None,
            b.call(
                b.name("Point"),
                vec![b.labeled("y", b.int(2)), b.labeled("x", b.int(1))],
            ),
        ),
        b.return_(Some(b.attr(b.name("p"), "x"))),
    ]);
    let main = b.function("main", vec![], vec![], Some(Type::int()), body);
    let module = main_module(
        &b,
        vec![Definition::Struct(point), Definition::Function(main)],
    );

    let modules = compile(&ids, vec![module], &CompileConfig::default()).unwrap();
    let main = function(&modules, "main");
    match let_value(&main, "p").kind {
        ExpressionKind::StructLiteral { values, .. } => {
            let values: Vec<i64> = values
                .iter()
                .map(|value| match value.kind {
                    ExpressionKind::Int(value) => value,
                    ref other => panic!("expected literal, got {other:?}"),
                })
                .collect();
            assert_eq!(values, vec![1, 2]);
        }
        other => panic!("expected struct literal, got {other:?}"),
    }
    assert!(p.ty.borrow().is_struct());
}

#[test]
fn option_case_becomes_a_two_arm_switch() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let t = b.type_param("T");
    let option = b.enum_def(
        "Option",
        vec![Rc::clone(&t)],
        vec![("None", vec![]), ("Some", vec![Type::param(&t)])],
    );
    let o = b.param("o", b.ty_apply("Option", &["int"]));
    let v = b.variable("v");
    let case = b.case(
        b.name("o"),
        vec![
            b.arm("Some", &[v], b.return_(Some(b.name("v")))),
            b.arm("None", &[], b.return_(Some(b.int(0)))),
        ],
        None,
    );
    let unwrap = b.function("unwrap", vec![], vec![o], Some(Type::int()), case);
    let module = main_module(
        &b,
        vec![Definition::Enum(option), Definition::Function(unwrap)],
    );

    let modules = compile(&ids, vec![module], &stop_after(Phase::Enums)).unwrap();
    let unwrap = function(&modules, "unwrap");
    let switches = statements(&unwrap, |kind| matches!(kind, StatementKind::Switch { .. }));
    assert_eq!(switches.len(), 1);
    let StatementKind::Switch { arms, .. } = &switches[0].kind else {
        panic!("expected switch");
    };
    assert_eq!(arms.len(), 2);
    let some = arms
        .iter()
        .find(|arm| arm.value == 1)
        .map(|arm| arm.body.clone())
        .unwrap();
    let StatementKind::Compound(body) = &some.kind else {
        panic!("expected compound arm body, got {:?}", some.kind);
    };
    let lets = body
        .iter()
        .filter(|statement| matches!(statement.kind, StatementKind::Let { .. }))
        .count();
    assert_eq!(lets, 1);
}

#[test]
fn class_with_a_defaulted_field_lowers_to_a_one_field_struct() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let account = b.class_def(
        "Account",
        vec![],
        vec![
            b.var_def("balance", Type::int(), None),
            b.var_def("limit", Type::int(), Some(b.int(100))),
        ],
        vec![],
    );
    let a = b.variable("a");
    let body = b.compound(vec![
        b.let_(
            &a,
            None,
            b.call(b.name("Account"), vec![b.labeled("balance", b.int(5))]),
        ),
        b.return_(Some(b.attr(b.name("a"), "limit"))),
    ]);
    let main = b.function("main", vec![], vec![], Some(Type::int()), body);
    let module = main_module(
        &b,
        vec![Definition::Class(account), Definition::Function(main)],
    );

    let modules = compile(&ids, vec![module], &CompileConfig::default()).unwrap();
    let Some(Definition::Struct(layout)) = modules[1].definition("Account") else {
        panic!("missing layout struct");
    };
    assert_eq!(layout.fields.len(), 1);
    let ctor = function(&modules, "Account_ctor");
    assert_eq!(ctor.parameters.len(), 1);

    // The defaulted member reads as its initializer.
    let main = function(&modules, "main");
    let body = main.body.borrow();
    let StatementKind::Compound(parts) = &body.kind else {
        panic!("expected compound, got {:?}", body.kind);
    };
    match &parts[1].kind {
        StatementKind::Return(Some(value)) => {
            assert!(matches!(value.kind, ExpressionKind::Int(100)));
        }
        other => panic!("expected return, got {other:?}"),
    }
}

#[test]
fn array_for_lowers_to_a_bounded_while() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let x = b.variable("x");
    let numbers = b.array(vec![b.int(1), b.int(2), b.int(3)]);
    let print = b.expr_stmt(b.call(b.name("print"), vec![b.arg(b.to_string(b.name("x")))]));
    let main = b.function("main", vec![], vec![], None, b.for_(&x, numbers, print));
    let mut module = main_module(&b, vec![Definition::Function(main)]);
    module.imports.push(b.import_names("std", &["print"]));

    let modules = compile(&ids, vec![module], &stop_after(Phase::Loops)).unwrap();
    let main = function(&modules, "main");
    let body = main.body.borrow();
    let StatementKind::Compound(parts) = &body.kind else {
        panic!("expected compound, got {:?}", body.kind);
    };
    assert_eq!(parts.len(), 3);
    let StatementKind::While { condition, .. } = &parts[2].kind else {
        panic!("expected while, got {:?}", parts[2].kind);
    };
    match &condition.kind {
        ExpressionKind::Binop {
            op: BinaryOp::Lt,
            rhs,
            ..
        } => assert!(matches!(rhs.kind, ExpressionKind::Int(3))),
        other => panic!("expected bound check, got {other:?}"),
    }
    assert!(x.ty.borrow().is_int());
}

#[test]
fn literal_comparison_checks_to_bool_and_folds_to_true() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let flag = b.variable("flag");
    let value = b.binop(
        BinaryOp::Lt,
        b.binop(BinaryOp::Add, b.int(1), b.int(2)),
        b.int(4),
    );
    let main = b.function("main", vec![], vec![], None, b.let_(&flag, None, value));

    let checked = check(&ids, vec![main_module(&b, vec![Definition::Function(main)])]).unwrap();
    assert!(flag.ty.borrow().is_bool());

    let twin = IdGen::new();
    let b = Builder::new(&twin);
    let flag = b.variable("flag");
    let value = b.binop(
        BinaryOp::Lt,
        b.binop(BinaryOp::Add, b.int(1), b.int(2)),
        b.int(4),
    );
    let main = b.function("main", vec![], vec![], None, b.let_(&flag, None, value));
    let module = main_module(&b, vec![Definition::Function(main)]);
    let modules = compile(&twin, vec![module], &CompileConfig::default()).unwrap();

    assert!(matches!(
        let_value(&function(&checked, "main"), "flag").kind,
        ExpressionKind::Binop { .. }
    ));
    let folded = let_value(&function(&modules, "main"), "flag");
    assert!(matches!(folded.kind, ExpressionKind::Bool(true)));
    assert!(folded.ty.is_bool());
}

/// A struct and two functions using only constructs the backends accept.
fn plain_program(b: &Builder<'_>) -> Module {
    let point = b.struct_def(
        "Point",
        vec![],
        vec![b.field("x", Type::int()), b.field("y", Type::int())],
    );
    let p = b.param("p", b.ty("Point"));
    let s = b.variable("s");
    let square = |field: &str| {
        b.binop(
            BinaryOp::Mul,
            b.attr(b.name("p"), field),
            b.attr(b.name("p"), field),
        )
    };
    let countdown: Statement = b.while_(
        b.binop(BinaryOp::Gt, b.name("s"), b.int(10)),
        b.assign(b.name("s"), b.binop(BinaryOp::Sub, b.name("s"), b.int(1))),
    );
    let norm = b.function(
        "norm",
        vec![],
        vec![p],
        Some(Type::int()),
        b.compound(vec![
            b.let_(&s, None, b.binop(BinaryOp::Add, square("x"), square("y"))),
            countdown,
            b.if_(
                b.binop(BinaryOp::Eq, b.name("s"), b.int(0)),
                b.return_(Some(b.int(1))),
                Some(b.return_(Some(b.name("s")))),
            ),
        ]),
    );
    main_module(b, vec![Definition::Struct(point), Definition::Function(norm)])
}

#[test]
fn lowering_leaves_plain_programs_unchanged() {
    let checked = {
        let ids = IdGen::new();
        let b = Builder::new(&ids);
        check(&ids, vec![plain_program(&b)]).unwrap()
    };
    let lowered = {
        let ids = IdGen::new();
        let b = Builder::new(&ids);
        compile(&ids, vec![plain_program(&b)], &CompileConfig::default()).unwrap()
    };

    let names = |modules: &[Module]| -> Vec<String> {
        modules[1]
            .definitions
            .iter()
            .map(|definition| definition.name().to_owned())
            .collect()
    };
    assert_eq!(names(&lowered), names(&checked));
    assert_eq!(
        shape(&function(&lowered, "norm")),
        shape(&function(&checked, "norm"))
    );
}

#[test]
fn modules_are_compiled_in_import_order() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let twice = {
        let n = b.param("n", Type::int());
        b.function(
            "twice",
            vec![],
            vec![n],
            Some(Type::int()),
            b.return_(Some(b.binop(BinaryOp::Mul, b.name("n"), b.int(2)))),
        )
    };
    let mut util = b.module("util");
    util.add(Definition::Function(twice));

    let main = b.function(
        "main",
        vec![],
        vec![],
        Some(Type::int()),
        b.return_(Some(b.call(b.name("twice"), vec![b.arg(b.int(21))]))),
    );
    let mut module = main_module(&b, vec![Definition::Function(main)]);
    module.imports.push(b.import_names("util", &["twice"]));

    let modules = compile(&ids, vec![module, util], &CompileConfig::default()).unwrap();
    let order: Vec<&str> = modules.iter().map(Module::name).collect();
    assert_eq!(order, vec!["std", "util", "main"]);
}

#[test]
fn early_return_on_a_literal_condition_compiles() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let body = b.compound(vec![
        b.if_(
            b.binop(BinaryOp::Lt, b.int(1), b.int(2)),
            b.return_(Some(b.int(1))),
            None,
        ),
        b.return_(Some(b.int(2))),
    ]);
    let main = b.function("main", vec![], vec![], Some(Type::int()), body);
    let module = main_module(&b, vec![Definition::Function(main)]);

    let modules = compile(&ids, vec![module], &CompileConfig::default()).unwrap();
    let main = function(&modules, "main");
    let returns = statements(&main, |kind| matches!(kind, StatementKind::Return(_)));
    assert_eq!(returns.len(), 1);
}
