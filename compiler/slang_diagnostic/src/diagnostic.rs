//! Diagnostics and diagnostic batches.

use slang_ir::Location;
use thiserror::Error;

use crate::ErrorCode;

/// One reported problem.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{module}:{location}: error[{code}]: {message}")]
pub struct Diagnostic {
    pub code: ErrorCode,
    /// Name of the module the problem was found in.
    pub module: String,
    pub location: Location,
    pub message: String,
}

impl Diagnostic {
    /// An error with the given code and no message yet.
    pub fn error(code: ErrorCode) -> Self {
        Diagnostic {
            code,
            module: String::new(),
            location: Location::GENERATED,
            message: code.description().to_owned(),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn in_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }
}

/// All diagnostics of a failed pass or compilation run, in report order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Error)]
#[error("{}", summarize(.0))]
pub struct Diagnostics(pub Vec<Diagnostic>);

fn summarize(diagnostics: &[Diagnostic]) -> String {
    match diagnostics {
        [] => "no errors".to_owned(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

impl Diagnostics {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    /// Codes in report order.
    pub fn codes(&self) -> Vec<ErrorCode> {
        self.0.iter().map(|d| d.code).collect()
    }

    pub fn contains(&self, code: ErrorCode) -> bool {
        self.0.iter().any(|d| d.code == code)
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
