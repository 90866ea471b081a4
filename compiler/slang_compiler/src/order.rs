//! Dependency order of a program's modules.
//!
//! A module comes after every module it imports. Imports of modules that are
//! not part of the program (the runtime module, or missing modules) do not
//! constrain the order; scope filling resolves or reports them later.

use rustc_hash::FxHashMap;
use slang_diagnostic::{Diagnostic, Diagnostics, ErrorCode};
use slang_ir::{Location, Module};
use slang_lower::RUNTIME_MODULE;
use slang_stack::ensure_sufficient_stack;
use tracing::debug;

#[derive(Copy, Clone, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Sort `modules` so that imports come first, keeping the given order among
/// independent modules.
#[tracing::instrument(level = "debug", skip_all, fields(modules = modules.len()))]
pub(crate) fn dependency_order(modules: Vec<Module>) -> Result<Vec<Module>, Diagnostics> {
    let (order, errors) = {
        let mut sorter = Sorter {
            modules: &modules,
            index: FxHashMap::default(),
            marks: vec![None; modules.len()],
            order: Vec::with_capacity(modules.len()),
            errors: Diagnostics::default(),
        };
        sorter.index_names();
        for i in 0..modules.len() {
            if sorter.marks[i].is_none() {
                sorter.visit(i);
            }
        }
        (sorter.order, sorter.errors)
    };
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut slots: Vec<Option<Module>> = modules.into_iter().map(Some).collect();
    let sorted: Vec<Module> = order.iter().filter_map(|&i| slots[i].take()).collect();
    debug!(
        order = ?sorted.iter().map(Module::name).collect::<Vec<_>>(),
        "modules ordered"
    );
    Ok(sorted)
}

struct Sorter<'m> {
    modules: &'m [Module],
    index: FxHashMap<&'m str, usize>,
    marks: Vec<Option<Mark>>,
    /// Module indices, dependencies first.
    order: Vec<usize>,
    errors: Diagnostics,
}

impl Sorter<'_> {
    fn index_names(&mut self) {
        let modules = self.modules;
        for (i, module) in modules.iter().enumerate() {
            let name = module.name();
            if name == RUNTIME_MODULE || self.index.insert(name, i).is_some() {
                self.errors.0.push(
                    Diagnostic::error(ErrorCode::E1001)
                        .with_message(format!("module `{name}` is defined twice"))
                        .at(Location::GENERATED)
                        .in_module(name),
                );
            }
        }
    }

    fn visit(&mut self, i: usize) {
        let modules = self.modules;
        let module = &modules[i];
        self.marks[i] = Some(Mark::Visiting);
        for import in &module.imports {
            let Some(&dependency) = self.index.get(import.module.as_str()) else {
                continue;
            };
            match self.marks[dependency] {
                None => ensure_sufficient_stack(|| self.visit(dependency)),
                Some(Mark::Done) => {}
                Some(Mark::Visiting) => self.errors.0.push(
                    Diagnostic::error(ErrorCode::E1005)
                        .with_message(format!(
                            "import of `{}` from `{}` forms a cycle",
                            import.module,
                            module.name()
                        ))
                        .at(import.location)
                        .in_module(module.name()),
                ),
            }
        }
        self.marks[i] = Some(Mark::Done);
        self.order.push(i);
    }
}
