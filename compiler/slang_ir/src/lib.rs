//! Slang IR: the tree every front-end pass reads and rewrites.
//!
//! This crate holds the data model shared by scope filling, name binding,
//! type evaluation, type checking and the lowering pipeline:
//!
//! - [`Location`] and [`Id`]/[`IdGen`] for source positions and identities
//! - [`Type`], the shared mutable type cell, and [`TyCon`] type constructors
//! - [`Definition`] and the definition structs in [`defs`]
//! - [`Scope`], parent-less name maps
//! - statements and expressions in [`ast`]
//! - [`Module`], the per-source-file root
//! - [`visitor::VisitorMut`] for whole-tree walks
//! - [`build::Builder`], the construction API used by the parser and tests
//!
//! # Ownership
//!
//! Statement and expression trees are owned and rewritten with
//! `std::mem::take`. Definitions and type cells are `Rc`-shared, which makes
//! the whole model single-threaded.

pub mod ast;
pub mod build;
pub mod defs;
mod id;
mod location;
mod module;
mod scope;
mod types;
pub mod visitor;

pub use ast::{
    BinaryOp, CaseArm, Expression, ExpressionKind, Iteration, LabeledExpression, Statement,
    StatementKind, SwitchArm, UnaryOp,
};
pub use defs::Definition;
pub use id::{Id, IdGen};
pub use location::Location;
pub use module::{Import, ImportKind, Module};
pub use scope::{Scope, ScopeKind};
pub use types::{BaseType, FunctionType, TyCon, Type, TypeExpr, TypeKind};
