#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::rc::Rc;

use pretty_assertions::assert_eq;
use slang_diagnostic::ErrorCode;
use slang_ir::build::Builder;
use slang_ir::defs::FunctionDef;
use slang_ir::{
    BinaryOp, Definition, ExpressionKind, IdGen, Module, Statement, StatementKind, Type, TypeKind,
};

use crate::test_support::{function, let_value, lower, names, try_lower};
use crate::Phase;

/// ```text
/// class Counter {
///     count: int
///     step: int = 1
///     fn bump(n: int) -> int { return count + n + step }
/// }
/// ```
fn counter(b: &Builder<'_>) -> Definition {
    let n = b.param("n", Type::int());
    let total = b.binop(
        BinaryOp::Add,
        b.binop(BinaryOp::Add, b.name("count"), b.name("n")),
        b.name("step"),
    );
    let bump = b.function("bump", vec![], vec![n], Some(Type::int()), b.return_(Some(total)));
    Definition::Class(b.class_def(
        "Counter",
        vec![],
        vec![
            b.var_def("count", Type::int(), None),
            b.var_def("step", Type::int(), Some(b.int(1))),
        ],
        vec![bump],
    ))
}

fn program(b: &Builder<'_>, main_body: Vec<Statement>) -> Module {
    let main = b.function("main", vec![], vec![], None, b.compound(main_body));
    let mut module = b.module("main");
    module.add(counter(b));
    module.add(Definition::Function(main));
    module
}

fn callee(function: &FunctionDef, variable: &str) -> String {
    match let_value(function, variable).kind {
        ExpressionKind::Call { callee, .. } => match callee.kind {
            ExpressionKind::Ref(Definition::Function(target)) => target.id.name().to_owned(),
            other => panic!("expected direct call, got {other:?}"),
        },
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn class_becomes_struct_constructor_and_functions() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let module = program(&b, vec![]);

    let modules = lower(&ids, vec![module], Phase::Classes);
    assert_eq!(
        names(&modules[1]),
        vec!["Counter", "Counter_ctor", "Counter_bump", "main"]
    );
    let Some(Definition::Struct(layout)) = modules[1].definition("Counter") else {
        panic!("missing layout struct");
    };
    let fields: Vec<&str> = layout.fields.iter().map(|f| f.id.name()).collect();
    assert_eq!(fields, vec!["count"]);

    let ctor = function(&modules, "Counter_ctor");
    let params: Vec<&str> = ctor.parameters.iter().map(|p| p.id.name()).collect();
    assert_eq!(params, vec!["count"]);
    assert!(ctor.return_ty.is_struct());

    let bump = function(&modules, "Counter_bump");
    let params: Vec<&str> = bump.parameters.iter().map(|p| p.id.name()).collect();
    assert_eq!(params, vec!["this", "n"]);
    assert!(bump.parameters[0].ty.borrow().is_struct());
    assert!(bump.this_param.get().is_none());
}

#[test]
fn lifted_methods_read_the_receiver_and_inline_constants() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let modules = lower(&ids, vec![program(&b, vec![])], Phase::Classes);
    let bump = function(&modules, "Counter_bump");

    let body = bump.body.borrow();
    let StatementKind::Return(Some(total)) = &body.kind else {
        panic!("expected return, got {:?}", body.kind);
    };
    let ExpressionKind::Binop { lhs, rhs, .. } = &total.kind else {
        panic!("expected sum, got {:?}", total.kind);
    };
    assert!(matches!(rhs.kind, ExpressionKind::Int(1)));
    let ExpressionKind::Binop { lhs: count, .. } = &lhs.kind else {
        panic!("expected sum, got {:?}", lhs.kind);
    };
    match &count.kind {
        ExpressionKind::GetAttr { base, attr } => {
            assert_eq!(attr, "count");
            match &base.kind {
                ExpressionKind::Ref(Definition::Parameter(this)) => {
                    assert!(Rc::ptr_eq(this, &bump.parameters[0]));
                }
                other => panic!("expected receiver, got {other:?}"),
            }
        }
        other => panic!("expected member read, got {other:?}"),
    }
}

#[test]
fn constructions_and_method_calls_become_direct_calls() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let c = b.variable("c");
    let r = b.variable("r");
    let module = program(
        &b,
        vec![
            b.let_(&c, None, b.call(b.name("Counter"), vec![b.labeled("count", b.int(0))])),
            b.let_(&r, None, b.call(b.attr(b.name("c"), "bump"), vec![b.arg(b.int(2))])),
        ],
    );

    let modules = lower(&ids, vec![module], Phase::Classes);
    let main = function(&modules, "main");
    assert_eq!(callee(&main, "c"), "Counter_ctor");
    assert_eq!(callee(&main, "r"), "Counter_bump");
    match let_value(&main, "r").kind {
        ExpressionKind::Call { args, .. } => {
            assert_eq!(args.len(), 2);
            assert!(matches!(
                &args[0].value.kind,
                ExpressionKind::Ref(Definition::Variable(receiver)) if Rc::ptr_eq(receiver, &c)
            ));
        }
        other => panic!("expected call, got {other:?}"),
    }
    assert!(c.ty.borrow().is_struct());
    assert!(r.ty.borrow().is_int());
}

#[test]
fn generic_methods_get_their_own_type_parameters() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let t = b.type_param("T");
    let get = b.function(
        "get",
        vec![],
        vec![],
        Some(Type::param(&t)),
        b.return_(Some(b.name("value"))),
    );
    let cell = b.class_def(
        "Cell",
        vec![Rc::clone(&t)],
        vec![b.var_def("value", Type::param(&t), None)],
        vec![get],
    );
    let c = b.variable("c");
    let v = b.variable("v");
    let main = b.function(
        "main",
        vec![],
        vec![],
        None,
        b.compound(vec![
            b.let_(&c, None, b.call(b.name("Cell"), vec![b.labeled("value", b.int(7))])),
            b.let_(&v, None, b.call(b.attr(b.name("c"), "get"), vec![])),
        ]),
    );
    let mut module = b.module("main");
    module.add(Definition::Class(cell));
    module.add(Definition::Function(main));

    let modules = lower(&ids, vec![module], Phase::Classes);
    let lifted = function(&modules, "Cell_get");
    let ctor = function(&modules, "Cell_ctor");
    assert_eq!(lifted.type_parameters.len(), 1);
    assert_eq!(ctor.type_parameters.len(), 1);
    assert_ne!(lifted.type_parameters[0].id, t.id);
    assert_ne!(lifted.type_parameters[0].id, ctor.type_parameters[0].id);
    match &*lifted.return_ty.kind() {
        TypeKind::Param(param) => assert_eq!(param.id, lifted.type_parameters[0].id),
        _ => panic!("expected type parameter, got {}", lifted.return_ty),
    }
    assert!(v.ty.borrow().is_int());
}

#[test]
fn interfaces_are_dropped() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let mut module = program(&b, vec![]);
    let describe = b.function_decl("describe", vec![], Some(Type::str()));
    module.add(Definition::Interface(b.interface_def("Describe", vec![], vec![describe])));

    let modules = lower(&ids, vec![module], Phase::Classes);
    assert!(modules[1].definition("Describe").is_none());
}

#[test]
fn methods_used_as_values_are_rejected() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let c = b.variable("c");
    let f = b.variable("f");
    let module = program(
        &b,
        vec![
            b.let_(&c, None, b.call(b.name("Counter"), vec![b.labeled("count", b.int(0))])),
            b.let_(&f, None, b.attr(b.name("c"), "bump")),
        ],
    );

    let errors = try_lower(&ids, vec![module], Phase::Classes).unwrap_err();
    assert_eq!(errors.codes(), vec![ErrorCode::E3002]);
}
