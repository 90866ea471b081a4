//! Diagnostics for the Slang front end.
//!
//! Every problem a pass detects becomes a [`Diagnostic`]: an [`ErrorCode`],
//! the module it was found in, a source location and a message. Passes
//! collect diagnostics in a [`DiagnosticSink`] and hand the whole batch back
//! as [`Diagnostics`] when they finish, so a compilation run reports every
//! error it found rather than stopping at the first one.

mod diagnostic;
mod error_code;
mod sink;

pub use diagnostic::{Diagnostic, Diagnostics};
pub use error_code::ErrorCode;
pub use sink::DiagnosticSink;
