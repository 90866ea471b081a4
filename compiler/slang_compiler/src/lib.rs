//! Slang compiler driver.
//!
//! Takes the unordered module trees of one program, as built by a parser or
//! by [`slang_ir::build`], and runs them through the whole front end and the
//! lowering pipeline. No IO happens here: source comes in as trees and
//! results come out as lowered trees or a [`CompileError`].
//!
//! # Usage
//!
//! ```ignore
//! use slang_compiler::{compile, CompileConfig};
//!
//! let ids = IdGen::new();
//! let modules = parse_program(&ids, sources);
//! let lowered = compile(&ids, modules, &CompileConfig::default())?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! slang_ir, slang_diagnostic, slang_resolve, slang_types, slang_lower
//!                          ↓
//!                   slang_compiler  ← this crate
//!                          ↓
//!                  parser / backends
//! ```

mod order;
mod output;
mod pipeline;

pub use output::{CompileError, Stage};
pub use pipeline::{check, compile, CompileConfig};
pub use slang_lower::Phase;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call more than once. Enable with `RUST_LOG=slang_lower=debug`
/// or `RUST_LOG=slang_types=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
