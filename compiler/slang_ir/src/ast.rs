//! Statements and expressions.
//!
//! Trees are owned (`Box`/`Vec`); definitions are shared via `Rc`. Every node
//! carries a location and a type handle written by the checker. Passes that
//! rewrite a node take it out with `std::mem::take` and put the replacement
//! back, which is why both node types implement `Default`.

use std::rc::Rc;

use crate::defs::{EnumVariant, Variable};
use crate::{Definition, Location, Scope, Type};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,
}

impl BinaryOp {
    pub const fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }

    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }

    pub const fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// A call argument with its optional label (`f(x: 1)`).
#[derive(Clone, Debug, Default)]
pub struct LabeledExpression {
    pub label: Option<String>,
    pub location: Location,
    pub value: Expression,
}

#[derive(Clone, Debug)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub location: Location,
    pub ty: Type,
}

impl Default for Expression {
    fn default() -> Self {
        Expression {
            kind: ExpressionKind::Undefined,
            location: Location::GENERATED,
            ty: Type::void(),
        }
    }
}

impl Expression {
    pub fn new(kind: ExpressionKind, location: Location) -> Self {
        Expression {
            kind,
            location,
            ty: Type::void(),
        }
    }

    pub fn typed(kind: ExpressionKind, location: Location, ty: Type) -> Self {
        Expression { kind, location, ty }
    }

    pub fn boxed(self) -> Box<Expression> {
        Box::new(self)
    }
}

#[derive(Clone, Debug)]
pub enum ExpressionKind {
    /// Placeholder for names that failed to resolve.
    Undefined,
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),
    Bool(bool),
    /// Unresolved name, as produced by the parser.
    Name(String),
    /// Resolved reference to a value definition.
    Ref(Definition),
    /// An expression that denotes a type (callee of constructions and casts).
    TypeLiteral(Type),
    /// `Enum.Variant` before it is turned into a construction.
    VariantRef {
        enum_ty: Type,
        variant: Rc<EnumVariant>,
    },
    GetAttr {
        base: Box<Expression>,
        attr: String,
    },
    GetIndex {
        base: Box<Expression>,
        indices: Vec<Expression>,
    },
    Binop {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Unop {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<LabeledExpression>,
    },
    ArrayLiteral(Vec<Expression>),
    /// Field values in declaration order.
    StructLiteral {
        ty: Type,
        values: Vec<Expression>,
    },
    UnionLiteral {
        ty: Type,
        field: String,
        value: Box<Expression>,
    },
    EnumLiteral {
        enum_ty: Type,
        variant: Rc<EnumVariant>,
        values: Vec<Expression>,
    },
    ClassLiteral {
        ty: Type,
        args: Vec<LabeledExpression>,
    },
    /// Numeric conversion.
    TypeCast {
        ty: Type,
        value: Box<Expression>,
    },
    ToString(Box<Expression>),
    /// Heap cell holding a union member.
    Box(Box<Expression>),
    /// Reinterpret a boxed union member as `ty`, without a tag check.
    Unbox {
        value: Box<Expression>,
        ty: Type,
    },
}

/// How a for-loop walks its source, decided once by the checker.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Iteration {
    /// Fixed-size array, indexed up to `size`.
    Array { size: usize },
    /// `iter()` returning something with `next()` returning an option enum.
    Iterable,
    /// `len()` and `get(index)`.
    Sequence,
}

#[derive(Clone, Debug)]
pub struct CaseArm {
    /// Variant name as written.
    pub name: String,
    pub location: Location,
    pub variables: Vec<Rc<Variable>>,
    pub body: Box<Statement>,
    /// Set by the checker.
    pub variant: Option<Rc<EnumVariant>>,
    pub scope: Rc<Scope>,
}

#[derive(Clone, Debug)]
pub struct SwitchArm {
    pub value: i64,
    pub location: Location,
    pub body: Statement,
}

#[derive(Clone, Debug)]
pub struct Statement {
    pub kind: StatementKind,
    pub location: Location,
    pub ty: Type,
}

impl Default for Statement {
    fn default() -> Self {
        Statement {
            kind: StatementKind::Pass,
            location: Location::GENERATED,
            ty: Type::void(),
        }
    }
}

impl Statement {
    pub fn new(kind: StatementKind, location: Location) -> Self {
        Statement {
            kind,
            location,
            ty: Type::void(),
        }
    }

    pub fn boxed(self) -> Box<Statement> {
        Box::new(self)
    }
}

#[derive(Clone, Debug)]
pub enum StatementKind {
    Pass,
    Break,
    Continue,
    Unreachable,
    Compound(Vec<Statement>),
    Expression(Expression),
    Let {
        variable: Rc<Variable>,
        type_hint: Option<Type>,
        value: Expression,
    },
    /// `target = value`, or `target op= value`.
    Assignment {
        target: Expression,
        op: Option<BinaryOp>,
        value: Expression,
    },
    /// A missing else branch is `Pass`.
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Box<Statement>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    Loop {
        body: Box<Statement>,
    },
    For {
        variable: Rc<Variable>,
        iterable: Expression,
        body: Box<Statement>,
        iteration: Option<Iteration>,
    },
    Case {
        value: Expression,
        arms: Vec<CaseArm>,
        else_branch: Option<Box<Statement>>,
    },
    Switch {
        value: Expression,
        arms: Vec<SwitchArm>,
        default: Box<Statement>,
    },
    Return(Option<Expression>),
    Raise(Expression),
    Try {
        body: Box<Statement>,
        except_ty: Type,
        variable: Rc<Variable>,
        handler: Box<Statement>,
    },
}
