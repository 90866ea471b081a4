//! Name resolution for Slang: the three passes between the parser and the
//! type checker.
//!
//! ```text
//! parser -> [fill_scopes] -> [bind_names] -> [evaluate_types] -> check_module
//! ```
//!
//! - [`fill_scopes`] registers every declaration in the scope of the
//!   construct that owns it and binds imports against already finished
//!   modules.
//! - [`bind_names`] replaces bare names and type syntax with resolved
//!   definitions and types, searching a stack of active scopes innermost
//!   first.
//! - [`evaluate_types`] instantiates generic types written without arguments
//!   and turns calls of types and enum variants into constructions.
//!
//! Each pass reports every error it finds in the module and fails the module
//! as one batch.

mod bind;
mod evaluate;
mod fill;

use std::rc::Rc;

use rustc_hash::FxHashMap;
use slang_ir::defs::ModuleRef;
use smallvec::SmallVec;

pub use bind::bind_names;
pub use evaluate::evaluate_types;
pub use fill::fill_scopes;

/// Finished modules by name, as seen by imports.
pub type ModuleMap = FxHashMap<String, Rc<ModuleRef>>;

/// Active scopes, innermost last.
type ScopeStack = SmallVec<[Rc<slang_ir::Scope>; 8]>;
