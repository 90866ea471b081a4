#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::rc::Rc;

use pretty_assertions::assert_eq;
use slang_ir::build::Builder;
use slang_ir::{
    BinaryOp, Definition, ExpressionKind, IdGen, Module, Statement, StatementKind, Type,
};

use crate::test_support::{function, let_value, lower, names, statements};
use crate::Phase;

fn option(b: &Builder<'_>) -> Definition {
    let t = b.type_param("T");
    Definition::Enum(b.enum_def(
        "Option",
        vec![Rc::clone(&t)],
        vec![("None", vec![]), ("Some", vec![Type::param(&t)])],
    ))
}

fn shape(b: &Builder<'_>) -> Definition {
    Definition::Enum(b.enum_def(
        "Shape",
        vec![],
        vec![("Empty", vec![]), ("Rect", vec![Type::int(), Type::int()])],
    ))
}

/// `fn unwrap(o: Option[int]) -> int { case o { Some(v): return v  None: return 0 } }`
/// and `fn main() -> Option[int] { return Option.Some(1) }`.
fn option_program(b: &Builder<'_>) -> Module {
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
    let some = b.call(b.attr(b.name("Option"), "Some"), vec![b.arg(b.int(1))]);
    let main = b.function(
        "main",
        vec![],
        vec![],
        Some(b.ty_apply("Option", &["int"])),
        b.return_(Some(some)),
    );
    let mut module = b.module("main");
    module.add(option(b));
    module.add(Definition::Function(unwrap));
    module.add(Definition::Function(main));
    module
}

fn switch_arms(statement: &Statement) -> Vec<(i64, Statement)> {
    match &statement.kind {
        StatementKind::Switch { arms, .. } => arms
            .iter()
            .map(|arm| (arm.value, arm.body.clone()))
            .collect(),
        other => panic!("expected switch, got {other:?}"),
    }
}

#[test]
fn enum_definitions_become_union_and_tagged_structs() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let modules = lower(&ids, vec![option_program(&b)], Phase::Enums);

    assert_eq!(names(&modules[1]), vec!["OptionData", "Option", "unwrap", "main"]);
    let Some(Definition::Struct(tagged)) = modules[1].definition("Option") else {
        panic!("missing tagged struct");
    };
    let fields: Vec<&str> = tagged.fields.iter().map(|f| f.id.name()).collect();
    assert_eq!(fields, vec!["tag", "data"]);
    assert!(tagged.fields[1].ty.is_union());
    assert_eq!(tagged.type_parameters.len(), 1);

    let unwrap = function(&modules, "unwrap");
    let o = &unwrap.parameters[0];
    assert!(o.ty.borrow().is_struct());
    assert!(o.ty.borrow().enum_def().is_none());
}

#[test]
fn case_becomes_a_switch_on_the_tag() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let modules = lower(&ids, vec![option_program(&b)], Phase::Enums);
    let unwrap = function(&modules, "unwrap");

    let switches = statements(&unwrap, |kind| matches!(kind, StatementKind::Switch { .. }));
    assert_eq!(switches.len(), 1);
    match &switches[0].kind {
        StatementKind::Switch { value, default, .. } => {
            assert!(matches!(&value.kind, ExpressionKind::GetAttr { attr, .. } if attr == "tag"));
            assert!(matches!(default.kind, StatementKind::Unreachable));
        }
        other => panic!("expected switch, got {other:?}"),
    }
    let arms = switch_arms(&switches[0]);
    let tags: Vec<i64> = arms.iter().map(|(tag, _)| *tag).collect();
    assert_eq!(tags, vec![1, 0]);

    // The `Some` arm binds its payload once, then runs the original body.
    let StatementKind::Compound(some) = &arms[0].1.kind else {
        panic!("expected compound arm body");
    };
    let lets = some
        .iter()
        .filter(|statement| matches!(statement.kind, StatementKind::Let { .. }))
        .count();
    assert_eq!(lets, 1);
    assert!(matches!(some.last().map(|s| &s.kind), Some(StatementKind::Return(_))));
    match let_value(&unwrap, "v").kind {
        ExpressionKind::GetAttr { base, attr } => {
            assert_eq!(attr, "Some");
            assert!(matches!(&base.kind, ExpressionKind::GetAttr { attr, .. } if attr == "data"));
        }
        other => panic!("expected payload read, got {other:?}"),
    }
}

#[test]
fn literals_carry_tag_and_payload() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let modules = lower(&ids, vec![option_program(&b)], Phase::Enums);
    let main = function(&modules, "main");

    let body = main.body.borrow();
    let StatementKind::Return(Some(value)) = &body.kind else {
        panic!("expected return, got {:?}", body.kind);
    };
    let ExpressionKind::StructLiteral { ty, values } = &value.kind else {
        panic!("expected struct literal, got {:?}", value.kind);
    };
    let tagged = ty.struct_def().map(|def| def.id.name().to_owned());
    assert_eq!(tagged, Some("Option".to_owned()));
    assert!(matches!(values[0].kind, ExpressionKind::Int(1)));
    match &values[1].kind {
        ExpressionKind::UnionLiteral { field, value, .. } => {
            assert_eq!(field, "Some");
            assert!(matches!(value.kind, ExpressionKind::Int(1)));
        }
        other => panic!("expected union literal, got {other:?}"),
    }
    assert!(main.return_ty.is_struct());
}

#[test]
fn multi_value_variants_use_an_auxiliary_struct() {
    let ids = IdGen::new();
    let b = Builder::new(&ids);
    let s = b.param("s", b.ty("Shape"));
    let w = b.variable("w");
    let h = b.variable("h");
    let case = b.case(
        b.name("s"),
        vec![b.arm(
            "Rect",
            &[w, h],
            b.return_(Some(b.binop(BinaryOp::Mul, b.name("w"), b.name("h")))),
        )],
        Some(b.return_(Some(b.int(0)))),
    );
    let area = b.function("area", vec![], vec![s], Some(Type::int()), case);
    let rect = b.call(
        b.attr(b.name("Shape"), "Rect"),
        vec![b.arg(b.int(2)), b.arg(b.int(3))],
    );
    let r = b.variable("r");
    let main = b.function("main", vec![], vec![], None, b.let_(&r, None, rect));
    let mut module = b.module("main");
    module.add(shape(&b));
    module.add(Definition::Function(area));
    module.add(Definition::Function(main));

    let modules = lower(&ids, vec![module], Phase::Enums);
    assert_eq!(
        names(&modules[1]),
        vec!["ShapeRectData", "ShapeData", "Shape", "area", "main"]
    );
    let area = function(&modules, "area");
    for (name, projection) in [("w", "f_0"), ("h", "f_1")] {
        match let_value(&area, name).kind {
            ExpressionKind::GetAttr { attr, .. } => assert_eq!(attr, projection),
            other => panic!("expected projection, got {other:?}"),
        }
    }
    let switches = statements(&area, |kind| matches!(kind, StatementKind::Switch { .. }));
    match &switches[0].kind {
        StatementKind::Switch { default, .. } => {
            assert!(matches!(default.kind, StatementKind::Return(_)));
        }
        other => panic!("expected switch, got {other:?}"),
    }

    let main = function(&modules, "main");
    let ExpressionKind::StructLiteral { values, .. } = let_value(&main, "r").kind else {
        panic!("expected tagged literal");
    };
    let ExpressionKind::UnionLiteral { value, .. } = &values[1].kind else {
        panic!("expected union literal");
    };
    match &value.kind {
        ExpressionKind::StructLiteral { ty, values } => {
            assert_eq!(ty.to_string(), "ShapeRectData");
            assert_eq!(values.len(), 2);
        }
        other => panic!("expected payload struct, got {other:?}"),
    }
}
