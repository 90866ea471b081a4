//! Structural unification over shared type cells.
//!
//! `unify` answers "are these two types the same?" and, as a side effect,
//! resolves inference placeholders. Resolution is one-directional: an
//! unresolved placeholder is linked to the other side only when that side is
//! a struct, class, enum, type parameter, `void`, `int`, `bool` or `str`
//! application. Two unresolved placeholders agree only when they are the same
//! cell. There is no occurs check; a placeholder may be linked to a type that
//! itself still contains placeholders.

use std::mem;

use slang_ir::{BaseType, Expression, ExpressionKind, TyCon, Type, TypeKind};
use slang_stack::ensure_sufficient_stack;
use thiserror::Error;

/// Two types that failed to unify.
#[derive(Clone, Debug, Error)]
#[error("expected `{expected}`, found `{found}`")]
pub struct Mismatch {
    pub expected: Type,
    pub found: Type,
}

/// Unify `a` with `b`, resolving placeholders on success.
///
/// A failed unification may still have resolved placeholders inside the
/// compared types before the failing component was reached.
pub fn unify(a: &Type, b: &Type) -> bool {
    ensure_sufficient_stack(|| unify_kinds(a, b))
}

/// Pairwise unification of two equally long lists.
pub fn unify_many(a: &[Type], b: &[Type]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| unify(x, y))
}

fn unify_kinds(a: &Type, b: &Type) -> bool {
    if a.same(b) {
        return true;
    }
    let left = a.kind().clone();
    let right = b.kind().clone();
    match (&left, &right) {
        (TypeKind::Meta {
            resolved: Some(target),
            ..
        }, _) => unify(target, b),
        (_, TypeKind::Meta {
            resolved: Some(target),
            ..
        }) => unify(a, target),
        // Distinct unresolved cells never agree.
        (TypeKind::Meta { resolved: None, .. }, TypeKind::Meta { resolved: None, .. }) => false,
        (TypeKind::Meta { resolved: None, .. }, _) => {
            is_placeholder_target(&right) && a.bind_meta(b)
        }
        (_, TypeKind::Meta { resolved: None, .. }) => unify(b, a),
        (
            TypeKind::App {
                tycon: left_con,
                args: left_args,
            },
            TypeKind::App {
                tycon: right_con,
                args: right_args,
            },
        ) => left_con.same(right_con) && unify_many(left_args, right_args),
        (TypeKind::Base(x), TypeKind::Base(y)) => x == y,
        (TypeKind::Function(f), TypeKind::Function(g)) => {
            unify(&f.ret, &g.ret) && unify_many(&f.params, &g.params)
        }
        (TypeKind::Array { element: x, .. }, TypeKind::Array { element: y, .. })
        | (TypeKind::Pointer(x), TypeKind::Pointer(y)) => unify(x, y),
        (TypeKind::Param(p), TypeKind::Param(q)) => p.id == q.id,
        (TypeKind::Unreachable, TypeKind::Unreachable) | (TypeKind::Void, TypeKind::Void) => true,
        _ => false,
    }
}

/// Kinds an unresolved placeholder may be linked to.
fn is_placeholder_target(kind: &TypeKind) -> bool {
    match kind {
        TypeKind::App { tycon, .. } => matches!(
            tycon,
            TyCon::Struct(_) | TyCon::Class(_) | TyCon::Enum(_)
        ),
        TypeKind::Base(base) => matches!(base, BaseType::Int | BaseType::Bool | BaseType::Str),
        TypeKind::Param(_) | TypeKind::Void => true,
        _ => false,
    }
}

/// Combine the type of one more branch into the accumulated result type.
///
/// A branch that cannot complete (`unreachable`) never constrains the result.
pub fn merge_paths(acc: &Type, branch: &Type) -> Result<Type, Mismatch> {
    if acc.is_unreachable() {
        Ok(branch.clone())
    } else if branch.is_unreachable() || unify(acc, branch) {
        Ok(acc.clone())
    } else {
        Err(Mismatch {
            expected: acc.clone(),
            found: branch.clone(),
        })
    }
}

/// Check `expression` against `expected`, widening `int` to `float` first.
///
/// The widening wraps the expression in place in an explicit cast.
pub fn coerce(expression: &mut Expression, expected: &Type) -> Result<(), Mismatch> {
    if expression.ty.is_int() && expected.is_float() {
        let inner = mem::take(expression);
        let location = inner.location;
        *expression = Expression::typed(
            ExpressionKind::TypeCast {
                ty: expected.clone(),
                value: inner.boxed(),
            },
            location,
            expected.clone(),
        );
    }
    if unify(&expression.ty, expected) {
        Ok(())
    } else {
        Err(Mismatch {
            expected: expected.clone(),
            found: expression.ty.clone(),
        })
    }
}
