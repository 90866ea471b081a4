//! Compilation pipeline: order → fill → bind → evaluate → check → lower → validate.

use std::rc::Rc;

use rustc_hash::FxHashSet;
use slang_diagnostic::{Diagnostic, Diagnostics, ErrorCode};
use slang_ir::{IdGen, Module, Scope};
use slang_lower::{
    lower_phase, runtime_module, validate, LoweringContext, Phase, Runtime, RUNTIME_MODULE,
};
use slang_resolve::{bind_names, evaluate_types, fill_scopes, ModuleMap};
use slang_types::check_module;
use tracing::debug;

use crate::order::dependency_order;
use crate::output::{CompileError, Stage};

/// Configuration for a compilation run.
#[derive(Clone, Debug)]
pub struct CompileConfig {
    /// Last lowering phase to run; `None` runs all of them.
    pub stop_after: Option<Phase>,
    /// Check the result against the backend contract. Only applies when
    /// every phase ran.
    pub validate: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            stop_after: None,
            validate: true,
        }
    }
}

/// Order `modules` and run the front end on each of them.
///
/// The result starts with the runtime module, followed by the program's
/// modules in dependency order. A module whose imports failed is not
/// checked; its own errors would only repeat theirs.
pub fn check(ids: &IdGen, modules: Vec<Module>) -> Result<Vec<Module>, CompileError> {
    let ordered = dependency_order(modules).map_err(|d| CompileError::new(Stage::Order, d))?;
    let mut all = Vec::with_capacity(ordered.len() + 1);
    all.push(runtime_module(ids));
    all.extend(ordered);

    let base = Scope::base(ids);
    let mut done = ModuleMap::default();
    let mut failed: FxHashSet<String> = FxHashSet::default();
    let mut errors = Diagnostics::default();
    for module in &mut all {
        let name = module.name().to_owned();
        if let Some(import) = module.imports.iter().find(|i| failed.contains(&i.module)) {
            debug!(module = %name, import = %import.module, "skipped: import failed");
            failed.insert(name);
            continue;
        }
        let checked = fill_scopes(module, ids, &done)
            .and_then(|()| bind_names(module, &base))
            .and_then(|()| evaluate_types(module))
            .and_then(|()| check_module(module));
        match checked {
            Ok(()) => {
                done.insert(name, Rc::clone(&module.handle));
            }
            Err(diagnostics) => {
                errors.extend(diagnostics);
                failed.insert(name);
            }
        }
    }
    if errors.is_empty() {
        Ok(all)
    } else {
        Err(CompileError::new(Stage::Check, errors))
    }
}

/// Compile one program: check every module, then lower them all.
///
/// Phases run one at a time over every module, and every module is
/// re-checked after each phase. The run stops at the first stage that
/// reports errors, returning all of that stage's diagnostics.
#[tracing::instrument(level = "debug", skip_all, fields(modules = modules.len()))]
pub fn compile(
    ids: &IdGen,
    modules: Vec<Module>,
    config: &CompileConfig,
) -> Result<Vec<Module>, CompileError> {
    let mut all = check(ids, modules)?;

    let runtime = Runtime::from_module(&all[0]).ok_or_else(|| {
        let missing = Diagnostic::error(ErrorCode::E9001)
            .with_message("runtime module lacks its builtins")
            .in_module(RUNTIME_MODULE);
        CompileError::new(Stage::Check, Diagnostics(vec![missing]))
    })?;
    let mut cx = LoweringContext::new(ids, runtime);
    for phase in Phase::ALL {
        if config.stop_after.is_some_and(|last| phase > last) {
            break;
        }
        let stage = Stage::Lower(phase);
        lower_phase(phase, &mut all, &mut cx).map_err(|d| CompileError::new(stage, d))?;
        recheck(&all).map_err(|d| CompileError::new(stage, d))?;
        debug!(%phase, "phase complete");
    }

    if config.validate && config.stop_after.is_none() {
        validate(&all).map_err(|d| CompileError::new(Stage::Validate, d))?;
    }
    debug!(modules = all.len(), "compiled");
    Ok(all)
}

fn recheck(modules: &[Module]) -> Result<(), Diagnostics> {
    let mut errors = Diagnostics::default();
    for module in modules {
        if let Err(diagnostics) = check_module(module) {
            errors.extend(diagnostics);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
