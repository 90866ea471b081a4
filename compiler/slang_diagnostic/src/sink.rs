//! Per-pass diagnostic collection.
//!
//! A [`DiagnosticSink`] gathers the errors of one pass over one module. It
//! also carries the per-definition taint flag: after the first error inside
//! a definition, further errors in that definition are dropped, because they
//! are almost always follow-on damage from the first one.

use slang_ir::Location;

use crate::{Diagnostic, Diagnostics, ErrorCode};

#[derive(Debug)]
pub struct DiagnosticSink {
    module: String,
    diagnostics: Vec<Diagnostic>,
    tainted: bool,
}

impl DiagnosticSink {
    pub fn new(module: &str) -> Self {
        DiagnosticSink {
            module: module.to_owned(),
            diagnostics: Vec::new(),
            tainted: false,
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Record an error unconditionally.
    pub fn error(&mut self, code: ErrorCode, location: Location, message: impl Into<String>) {
        let diagnostic = Diagnostic::error(code)
            .with_message(message)
            .at(location)
            .in_module(self.module.clone());
        self.diagnostics.push(diagnostic);
    }

    /// Start a new definition; clears the taint flag.
    pub fn begin_definition(&mut self) {
        self.tainted = false;
    }

    /// Whether the current definition already failed.
    pub fn is_tainted(&self) -> bool {
        self.tainted
    }

    /// Record an error unless the current definition already failed, then
    /// taint the definition.
    pub fn error_once(&mut self, code: ErrorCode, location: Location, message: impl Into<String>) {
        if !self.tainted {
            self.error(code, location, message);
            self.tainted = true;
        }
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    /// Close the pass: `Err` with every collected diagnostic if any.
    pub fn finish(self) -> Result<(), Diagnostics> {
        if self.diagnostics.is_empty() {
            Ok(())
        } else {
            Err(Diagnostics(self.diagnostics))
        }
    }
}
