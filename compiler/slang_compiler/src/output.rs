//! Failure type of a compilation run.

use std::fmt;

use slang_diagnostic::Diagnostics;
use slang_lower::Phase;
use thiserror::Error;

/// Which part of the run produced the diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Ordering modules by their imports.
    Order,
    /// Scope filling, name binding, type evaluation and type checking.
    Check,
    /// A lowering phase, or the re-check that follows it.
    Lower(Phase),
    /// The final backend contract check.
    Validate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Order => f.write_str("module ordering"),
            Stage::Check => f.write_str("checking"),
            Stage::Lower(phase) => write!(f, "lowering ({phase})"),
            Stage::Validate => f.write_str("validation"),
        }
    }
}

/// Every diagnostic of a failed run, with the stage that stopped it.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{stage} failed: {diagnostics}")]
pub struct CompileError {
    pub stage: Stage,
    pub diagnostics: Diagnostics,
}

impl CompileError {
    pub fn new(stage: Stage, diagnostics: Diagnostics) -> Self {
        CompileError { stage, diagnostics }
    }
}
