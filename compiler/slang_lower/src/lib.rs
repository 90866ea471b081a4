//! Lowering pipeline for Slang.
//!
//! Rewrites type-checked modules, in place, into the small language the
//! backends accept: structs, free functions, arrays, pointers and basic
//! control flow.
//!
//! # Pipeline Position
//!
//! ```text
//! check_module -> [Loops] -> check -> [Enums] -> check -> [Classes] -> check
//!              -> [Switches] -> check -> [Unions] -> check -> [ConstFold] -> check
//! ```
//!
//! Each [`Phase`] is applied to every module, in dependency order, before
//! the next one starts. The driver re-runs the type checker on every module
//! between phases, so a phase may leave stale types on the nodes it builds.
//!
//! | Phase | Eliminates |
//! |-------|------------|
//! | [`Phase::Loops`] | `loop`, `for`, indexing of `get` receivers, string conversion |
//! | [`Phase::Enums`] | enum definitions, `case`, enum literals, enum types |
//! | [`Phase::Classes`] | class and interface definitions, class literals, method calls |
//! | [`Phase::Switches`] | `switch` |
//! | [`Phase::Unions`] | union structs and union types |
//! | [`Phase::ConstFold`] | arithmetic on literals, `if` on literal booleans |
//!
//! Run-wide state (the runtime builtins and the records that map enum and
//! class identities to their replacements) lives in [`LoweringContext`].

mod classes;
mod const_fold;
mod context;
mod enums;
mod loops;
mod retype;
mod runtime;
mod switches;
mod unions;
mod validate;

#[cfg(test)]
mod test_support;

use std::fmt;

use slang_diagnostic::Diagnostics;
use slang_ir::Module;

pub use context::LoweringContext;
pub use runtime::{runtime_module, Runtime, RUNTIME_MODULE};
pub use validate::validate;

/// One lowering phase.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum Phase {
    Loops,
    Enums,
    Classes,
    Switches,
    Unions,
    ConstFold,
}

impl Phase {
    /// Every phase, in pipeline order.
    pub const ALL: [Phase; 6] = [
        Phase::Loops,
        Phase::Enums,
        Phase::Classes,
        Phase::Switches,
        Phase::Unions,
        Phase::ConstFold,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Phase::Loops => "loops",
            Phase::Enums => "enums",
            Phase::Classes => "classes",
            Phase::Switches => "switches",
            Phase::Unions => "unions",
            Phase::ConstFold => "const-fold",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Apply `phase` to every module of `modules`, in order.
///
/// Errors of all modules are collected before failing.
#[tracing::instrument(level = "debug", skip_all, fields(phase = %phase))]
pub fn lower_phase(
    phase: Phase,
    modules: &mut [Module],
    cx: &mut LoweringContext<'_>,
) -> Result<(), Diagnostics> {
    match phase {
        Phase::Loops => for_each_module(modules, |module| loops::lower_loops(module, cx)),
        Phase::Enums => enums::lower_enums(modules, cx),
        Phase::Classes => classes::lower_classes(modules, cx),
        Phase::Switches => {
            for module in modules.iter_mut() {
                switches::lower_switches(module, cx);
            }
            Ok(())
        }
        Phase::Unions => unions::erase_unions(modules),
        Phase::ConstFold => {
            for module in modules.iter_mut() {
                const_fold::fold_constants(module);
            }
            Ok(())
        }
    }
}

/// Run a fallible per-module rewrite on every module, keeping every error.
pub(crate) fn for_each_module(
    modules: &mut [Module],
    mut rewrite: impl FnMut(&mut Module) -> Result<(), Diagnostics>,
) -> Result<(), Diagnostics> {
    let mut errors = Diagnostics::default();
    for module in modules.iter_mut() {
        if let Err(diagnostics) = rewrite(module) {
            errors.extend(diagnostics);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
