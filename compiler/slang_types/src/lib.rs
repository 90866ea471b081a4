//! Types for Slang: unification, substitution, capability queries and the
//! type checker.
//!
//! # Pipeline Position
//!
//! ```text
//! scope filling -> name binding -> type evaluation -> [type checking] -> lowering
//!                                                          ^               |
//!                                                          +--- re-check --+
//! ```
//!
//! The checker runs once after type evaluation and again after every
//! lowering phase. It is idempotent on already-checked trees: it recomputes
//! every node's type and re-decides the iteration capability of each
//! for-loop, so lowering phases may leave stale types on the nodes they
//! synthesize.
//!
//! # Inference
//!
//! There is no substitution table. Placeholders are [`TypeKind::Meta`]
//! cells resolved in place by [`unify`]; see `slang_ir::Type`.
//!
//! [`TypeKind::Meta`]: slang_ir::TypeKind::Meta

mod check;
pub mod query;
mod subst;
mod unify;

pub use check::check_module;
pub use subst::{bind_arguments, fresh_instance, subst, subst_signature, Substitution};
pub use unify::{coerce, merge_paths, unify, unify_many, Mismatch};
