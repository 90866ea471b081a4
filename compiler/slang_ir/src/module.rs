//! Modules and imports.

use std::rc::Rc;

use crate::defs::ModuleRef;
use crate::{Definition, Id, Location};

/// `import m` or `from m import a, b`.
#[derive(Clone, Debug)]
pub struct Import {
    pub module: String,
    pub location: Location,
    pub kind: ImportKind,
}

#[derive(Clone, Debug)]
pub enum ImportKind {
    /// Binds the module itself under its own name.
    Module,
    /// Binds the listed members of the module.
    Names(Vec<(String, Location)>),
}

/// A source module, mutated in place by every pass.
#[derive(Debug)]
pub struct Module {
    pub handle: Rc<ModuleRef>,
    /// Top-level definitions in declaration order.
    pub definitions: Vec<Definition>,
    pub imports: Vec<Import>,
    /// Every name resolution performed in this module, for tooling.
    pub references: Vec<(Id, Location)>,
}

impl Module {
    pub fn name(&self) -> &str {
        self.handle.id.name()
    }

    pub fn add(&mut self, definition: Definition) {
        self.definitions.push(definition);
    }

    /// Names of the modules this one imports, in import order.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.imports.iter().map(|import| import.module.as_str())
    }

    /// Find a top-level definition by name.
    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.name() == name)
    }
}
