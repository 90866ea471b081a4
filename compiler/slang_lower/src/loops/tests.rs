#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::rc::Rc;

use pretty_assertions::assert_eq;
use slang_ir::build::Builder;
use slang_ir::defs::FunctionDef;
use slang_ir::{
    BinaryOp, Definition, ExpressionKind, IdGen, Module, Statement, StatementKind, Type,
};

use crate::test_support::{function, let_value, lower};
use crate::Phase;

fn module_with(b: &Builder<'_>, definitions: Vec<Definition>) -> Module {
    let mut module = b.module("main");
    module.imports.push(b.import_names("std", &["print"]));
    for definition in definitions {
        module.add(definition);
    }
    module
}

fn main_with(b: &Builder<'_>, body: Statement) -> Definition {
    Definition::Function(b.function("main", vec![], vec![], None, body))
}

fn body(function: &FunctionDef) -> Statement {
    function.body.borrow().clone()
}

fn compound(statement: &Statement) -> &[Statement] {
    match &statement.kind {
        StatementKind::Compound(statements) => statements,
        other => panic!("expected compound, got {other:?}"),
    }
}

#[test]
fn loop_becomes_while_true() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let module = module_with(&b, vec![main_with(&b, b.loop_(b.break_()))]);

    let modules = lower(&ids, vec![module], Phase::Loops);
    match body(&function(&modules, "main")).kind {
        StatementKind::While { condition, body } => {
            assert!(matches!(condition.kind, ExpressionKind::Bool(true)));
            assert!(matches!(body.kind, StatementKind::Break));
        }
        other => panic!("expected while, got {other:?}"),
    }
}

#[test]
fn array_loop_is_bounded_by_the_static_length() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let x = b.variable("x");
    let words = b.array(vec![b.str_("a"), b.str_("b"), b.str_("c")]);
    let print = b.expr_stmt(b.call(b.name("print"), vec![b.arg(b.name("x"))]));
    let module = module_with(&b, vec![main_with(&b, b.for_(&x, words, print))]);

    let modules = lower(&ids, vec![module], Phase::Loops);
    let main = function(&modules, "main");
    let lowered = body(&main);
    let statements = compound(&lowered);
    assert_eq!(statements.len(), 3);
    let StatementKind::While { condition, body } = &statements[2].kind else {
        panic!("expected while, got {:?}", statements[2].kind);
    };
    match &condition.kind {
        ExpressionKind::Binop {
            op: BinaryOp::Lt,
            rhs,
            ..
        } => assert!(matches!(rhs.kind, ExpressionKind::Int(3))),
        other => panic!("expected bound check, got {other:?}"),
    }

    // Element, then counter, then the original body.
    let step = compound(body);
    assert_eq!(step.len(), 3);
    assert!(matches!(
        &step[0].kind,
        StatementKind::Let { variable, .. } if Rc::ptr_eq(variable, &x)
    ));
    assert!(matches!(step[1].kind, StatementKind::Assignment { .. }));
    assert!(matches!(step[2].kind, StatementKind::Expression(_)));
    assert!(x.ty.borrow().is_str());
}

#[test]
fn sequence_loop_caches_the_length() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let index = b.param("i", Type::int());
    let range = b.class_def(
        "Range",
        vec![],
        vec![b.var_def("count", Type::int(), None)],
        vec![
            b.function(
                "len",
                vec![],
                vec![],
                Some(Type::int()),
                b.return_(Some(b.name("count"))),
            ),
            b.function(
                "get",
                vec![],
                vec![index],
                Some(Type::int()),
                b.return_(Some(b.name("i"))),
            ),
        ],
    );
    let r = b.param("r", b.ty("Range"));
    let x = b.variable("x");
    let y = b.variable("y");
    let sum = b.function(
        "sum",
        vec![],
        vec![r],
        None,
        b.for_(&x, b.name("r"), b.let_(&y, None, b.name("x"))),
    );
    let module = module_with(
        &b,
        vec![Definition::Class(range), Definition::Function(sum)],
    );

    let modules = lower(&ids, vec![module], Phase::Loops);
    let sum = function(&modules, "sum");
    let lowered = body(&sum);
    let statements = compound(&lowered);
    assert_eq!(statements.len(), 4);
    assert!(matches!(statements[3].kind, StatementKind::While { .. }));
    match let_value(&sum, "len").kind {
        ExpressionKind::Call { callee, args } => {
            assert!(args.is_empty());
            assert!(matches!(&callee.kind, ExpressionKind::GetAttr { attr, .. } if attr == "len"));
        }
        other => panic!("expected len call, got {other:?}"),
    }
    match let_value(&sum, "x").kind {
        ExpressionKind::Call { callee, args } => {
            assert_eq!(args.len(), 1);
            assert!(matches!(&callee.kind, ExpressionKind::GetAttr { attr, .. } if attr == "get"));
        }
        other => panic!("expected get call, got {other:?}"),
    }
    assert!(x.ty.borrow().is_int());
}

#[test]
fn integer_conversion_calls_the_runtime() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let s = b.variable("s");
    let t = b.variable("t");
    let body = b.compound(vec![
        b.let_(&s, None, b.to_string(b.int(42))),
        b.let_(&t, None, b.to_string(b.str_("kept"))),
    ]);
    let module = module_with(&b, vec![main_with(&b, body)]);

    let modules = lower(&ids, vec![module], Phase::Loops);
    let main = function(&modules, "main");
    match let_value(&main, "s").kind {
        ExpressionKind::Call { callee, args } => {
            assert_eq!(args.len(), 1);
            match &callee.kind {
                ExpressionKind::Ref(Definition::ExternFunction(builtin)) => {
                    assert_eq!(builtin.id.name(), "int_to_str");
                }
                other => panic!("expected builtin, got {other:?}"),
            }
        }
        other => panic!("expected call, got {other:?}"),
    }
    assert!(matches!(let_value(&main, "t").kind, ExpressionKind::Str(_)));
    assert!(s.ty.borrow().is_str());
}

/// `Option[T]`, a `Cursor` whose `next()` yields options and a `Bag` whose
/// `iter()` returns a cursor.
fn iterator_types(b: &Builder<'_>) -> Vec<Definition> {
    let t = b.type_param("T");
    let option = b.enum_def(
        "Option",
        vec![Rc::clone(&t)],
        vec![("None", vec![]), ("Some", vec![Type::param(&t)])],
    );
    let next = b.function(
        "next",
        vec![],
        vec![],
        Some(b.ty_apply("Option", &["int"])),
        b.return_(Some(b.call(b.attr(b.name("Option"), "None"), vec![]))),
    );
    let cursor = b.class_def(
        "Cursor",
        vec![],
        vec![b.var_def("pos", Type::int(), None)],
        vec![next],
    );
    let iter = b.function(
        "iter",
        vec![],
        vec![],
        Some(b.ty("Cursor")),
        b.return_(Some(b.call(b.name("Cursor"), vec![b.labeled("pos", b.int(0))]))),
    );
    let bag = b.class_def(
        "Bag",
        vec![],
        vec![b.var_def("size", Type::int(), None)],
        vec![iter],
    );
    vec![
        Definition::Enum(option),
        Definition::Class(cursor),
        Definition::Class(bag),
    ]
}

fn method_call(value: &ExpressionKind) -> &str {
    match value {
        ExpressionKind::Call { callee, args } if args.is_empty() => match &callee.kind {
            ExpressionKind::GetAttr { attr, .. } => attr,
            other => panic!("expected method, got {other:?}"),
        },
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn iterator_loop_calls_next_until_none() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let bag = b.param("bag", b.ty("Bag"));
    let x = b.variable("x");
    let y = b.variable("y");
    let sum = b.function(
        "sum",
        vec![],
        vec![bag],
        None,
        b.for_(&x, b.name("bag"), b.let_(&y, None, b.name("x"))),
    );
    let mut definitions = iterator_types(&b);
    definitions.push(Definition::Function(sum));
    let module = module_with(&b, definitions);

    let modules = lower(&ids, vec![module], Phase::Loops);
    let sum = function(&modules, "sum");
    let lowered = body(&sum);
    let statements = compound(&lowered);
    assert_eq!(statements.len(), 2);
    assert_eq!(method_call(&let_value(&sum, "it").kind), "iter");

    let StatementKind::While { condition, body } = &statements[1].kind else {
        panic!("expected while, got {:?}", statements[1].kind);
    };
    assert!(matches!(condition.kind, ExpressionKind::Bool(true)));
    let step = compound(body);
    assert_eq!(step.len(), 2);
    assert_eq!(method_call(&let_value(&sum, "next").kind), "next");
    let StatementKind::Case { arms, .. } = &step[1].kind else {
        panic!("expected case, got {:?}", step[1].kind);
    };
    let names: Vec<&str> = arms.iter().map(|arm| arm.name.as_str()).collect();
    assert_eq!(names, vec!["None", "Some"]);
    assert!(matches!(arms[0].body.kind, StatementKind::Break));
    assert!(Rc::ptr_eq(&arms[1].variables[0], &x));
    assert!(matches!(arms[1].body.kind, StatementKind::Let { .. }));
    assert!(x.ty.borrow().is_int());
}

#[test]
fn indexing_a_get_receiver_becomes_a_get_call() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let i = b.param("i", Type::int());
    let get = b.function(
        "get",
        vec![],
        vec![i],
        Some(Type::int()),
        b.return_(Some(b.name("i"))),
    );
    let table = b.class_def("Table", vec![], vec![], vec![get]);
    let t = b.param("t", b.ty("Table"));
    let y = b.variable("y");
    let read = b.function(
        "read",
        vec![],
        vec![t],
        None,
        b.let_(&y, None, b.index(b.name("t"), vec![b.int(2)])),
    );
    let module = module_with(
        &b,
        vec![Definition::Class(table), Definition::Function(read)],
    );

    let modules = lower(&ids, vec![module], Phase::Loops);
    let read = function(&modules, "read");
    match let_value(&read, "y").kind {
        ExpressionKind::Call { callee, args } => {
            assert!(matches!(&callee.kind, ExpressionKind::GetAttr { attr, .. } if attr == "get"));
            assert_eq!(args.len(), 1);
            assert!(matches!(args[0].value.kind, ExpressionKind::Int(2)));
        }
        other => panic!("expected get call, got {other:?}"),
    }
    assert!(y.ty.borrow().is_int());
}

#[test]
fn char_conversion_calls_the_runtime() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let s = b.variable("s");
    let body = b.let_(&s, None, b.to_string(b.char_('a')));
    let module = module_with(&b, vec![main_with(&b, body)]);

    let modules = lower(&ids, vec![module], Phase::Loops);
    let main = function(&modules, "main");
    match let_value(&main, "s").kind {
        ExpressionKind::Call { callee, .. } => match &callee.kind {
            ExpressionKind::Ref(Definition::ExternFunction(builtin)) => {
                assert_eq!(builtin.id.name(), "char_to_str");
            }
            other => panic!("expected builtin, got {other:?}"),
        },
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn user_type_conversion_calls_its_to_string_method() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let describe = b.function(
        "to_string",
        vec![],
        vec![],
        Some(Type::str()),
        b.return_(Some(b.str_("label"))),
    );
    let label = b.class_def("Label", vec![], vec![], vec![describe]);
    let l = b.param("l", b.ty("Label"));
    let s = b.variable("s");
    let show = b.function(
        "show",
        vec![],
        vec![l],
        None,
        b.let_(&s, None, b.to_string(b.name("l"))),
    );
    let module = module_with(
        &b,
        vec![Definition::Class(label), Definition::Function(show)],
    );

    let modules = lower(&ids, vec![module], Phase::Loops);
    let show = function(&modules, "show");
    assert_eq!(method_call(&let_value(&show, "s").kind), "to_string");
    assert!(s.ty.borrow().is_str());
}
