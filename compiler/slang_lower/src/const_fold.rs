//! Constant folding.
//!
//! Folds, bottom-up, operators whose operands are all literals, and `if`
//! statements whose condition is a literal boolean. A folded branch that
//! returns, raises or leaves a loop ends its block: the statements after it
//! are dropped, so the block still type-checks. Integer arithmetic that
//! would overflow or divide by zero is left for run time. Mixed `int` and
//! `float` operands fold as `float`, matching the implicit widening of the
//! checker.

use std::mem;

use slang_ir::visitor::{walk_expression, walk_statement, VisitorMut};
use slang_ir::{
    BinaryOp, Expression, ExpressionKind, Module, Statement, StatementKind, Type, UnaryOp,
};
use tracing::debug;

pub(crate) fn fold_constants(module: &mut Module) {
    let mut folder = ConstFolder::default();
    for definition in &module.definitions {
        folder.visit_definition(definition);
    }
    debug!(
        module = %module.name(),
        expressions = folder.expressions,
        branches = folder.branches,
        dead = folder.dead,
        "folded constants"
    );
}

#[derive(Default)]
struct ConstFolder {
    expressions: usize,
    branches: usize,
    /// Statements dropped after a folded exit.
    dead: usize,
}

/// Numeric literal operand.
#[derive(Copy, Clone, Debug)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn of(expression: &Expression) -> Option<Number> {
        match expression.kind {
            ExpressionKind::Int(value) => Some(Number::Int(value)),
            ExpressionKind::Float(value) => Some(Number::Float(value)),
            _ => None,
        }
    }

    #[expect(clippy::cast_precision_loss, reason = "same widening as the checker")]
    fn widen(self) -> f64 {
        match self {
            Number::Int(value) => value as f64,
            Number::Float(value) => value,
        }
    }
}

fn fold_binary(op: BinaryOp, lhs: &Expression, rhs: &Expression) -> Option<ExpressionKind> {
    if let (ExpressionKind::Bool(l), ExpressionKind::Bool(r)) = (&lhs.kind, &rhs.kind) {
        let (l, r) = (*l, *r);
        return match op {
            BinaryOp::And => Some(ExpressionKind::Bool(l && r)),
            BinaryOp::Or => Some(ExpressionKind::Bool(l || r)),
            BinaryOp::Eq => Some(ExpressionKind::Bool(l == r)),
            BinaryOp::NotEq => Some(ExpressionKind::Bool(l != r)),
            _ => None,
        };
    }
    let (lhs, rhs) = (Number::of(lhs)?, Number::of(rhs)?);
    match (lhs, rhs) {
        (Number::Int(l), Number::Int(r)) => fold_int(op, l, r),
        _ => fold_float(op, lhs.widen(), rhs.widen()),
    }
}

fn fold_int(op: BinaryOp, l: i64, r: i64) -> Option<ExpressionKind> {
    let value = match op {
        BinaryOp::Add => l.checked_add(r)?,
        BinaryOp::Sub => l.checked_sub(r)?,
        BinaryOp::Mul => l.checked_mul(r)?,
        BinaryOp::Div => l.checked_div(r)?,
        BinaryOp::Mod => l.checked_rem(r)?,
        BinaryOp::Eq => return Some(ExpressionKind::Bool(l == r)),
        BinaryOp::NotEq => return Some(ExpressionKind::Bool(l != r)),
        BinaryOp::Lt => return Some(ExpressionKind::Bool(l < r)),
        BinaryOp::LtEq => return Some(ExpressionKind::Bool(l <= r)),
        BinaryOp::Gt => return Some(ExpressionKind::Bool(l > r)),
        BinaryOp::GtEq => return Some(ExpressionKind::Bool(l >= r)),
        BinaryOp::And | BinaryOp::Or => return None,
    };
    Some(ExpressionKind::Int(value))
}

#[expect(clippy::float_cmp, reason = "folding must match run-time comparison exactly")]
fn fold_float(op: BinaryOp, l: f64, r: f64) -> Option<ExpressionKind> {
    let value = match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div => l / r,
        BinaryOp::Mod => l % r,
        BinaryOp::Eq => return Some(ExpressionKind::Bool(l == r)),
        BinaryOp::NotEq => return Some(ExpressionKind::Bool(l != r)),
        BinaryOp::Lt => return Some(ExpressionKind::Bool(l < r)),
        BinaryOp::LtEq => return Some(ExpressionKind::Bool(l <= r)),
        BinaryOp::Gt => return Some(ExpressionKind::Bool(l > r)),
        BinaryOp::GtEq => return Some(ExpressionKind::Bool(l >= r)),
        BinaryOp::And | BinaryOp::Or => return None,
    };
    Some(ExpressionKind::Float(value))
}

fn fold_unary(op: UnaryOp, operand: &Expression) -> Option<ExpressionKind> {
    match (op, &operand.kind) {
        (UnaryOp::Neg, ExpressionKind::Int(value)) => value.checked_neg().map(ExpressionKind::Int),
        (UnaryOp::Neg, ExpressionKind::Float(value)) => Some(ExpressionKind::Float(-value)),
        (UnaryOp::Not, ExpressionKind::Bool(value)) => Some(ExpressionKind::Bool(!value)),
        _ => None,
    }
}

impl VisitorMut for ConstFolder {
    fn visit_statement(&mut self, statement: &mut Statement) {
        walk_statement(self, statement);
        match &mut statement.kind {
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if let ExpressionKind::Bool(taken) = condition.kind {
                    let branch = if taken { then_branch } else { else_branch };
                    *statement = mem::take(&mut **branch);
                    self.branches += 1;
                } else if then_branch.ty.is_unreachable() && else_branch.ty.is_unreachable() {
                    statement.ty = Type::unreachable();
                }
            }
            StatementKind::Compound(statements) => {
                // A taken branch that leaves the block makes the rest dead.
                if let Some(exit) = statements.iter().position(|s| s.ty.is_unreachable()) {
                    self.dead += statements.len() - exit - 1;
                    statements.truncate(exit + 1);
                }
                if let Some(last) = statements.last() {
                    statement.ty = last.ty.clone();
                }
            }
            _ => {}
        }
    }

    fn visit_expression(&mut self, expression: &mut Expression) {
        walk_expression(self, expression);
        let folded = match &expression.kind {
            ExpressionKind::Binop { op, lhs, rhs } => fold_binary(*op, lhs, rhs),
            ExpressionKind::Unop { op, operand } => fold_unary(*op, operand),
            _ => None,
        };
        if let Some(kind) = folded {
            expression.kind = kind;
            self.expressions += 1;
        }
    }
}
