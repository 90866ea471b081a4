//! Name to definition maps.
//!
//! A scope belongs to exactly one scoped definition or case arm and keeps no
//! link to its parent. Passes that resolve names keep their own stack of
//! active scopes and search it innermost first.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::defs::TypeDef;
use crate::{BaseType, Definition, IdGen, Location, Type};

/// What kind of construct owns a scope.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ScopeKind {
    /// Built-in primitive type names.
    Base,
    Module,
    Function,
    Struct,
    Enum,
    Class,
    Interface,
    /// A case arm.
    Block,
}

pub struct Scope {
    kind: ScopeKind,
    symbols: RefCell<FxHashMap<String, Definition>>,
}

impl Scope {
    pub fn new(kind: ScopeKind) -> Rc<Scope> {
        Rc::new(Scope {
            kind,
            symbols: RefCell::new(FxHashMap::default()),
        })
    }

    /// The outermost scope: one type alias per source-nameable primitive.
    pub fn base(ids: &IdGen) -> Rc<Scope> {
        let scope = Scope::new(ScopeKind::Base);
        for base in BaseType::PRIMITIVES {
            let alias = Rc::new(TypeDef {
                id: ids.fresh(base.name()),
                location: Location::GENERATED,
                ty: Type::base(base),
            });
            scope
                .symbols
                .borrow_mut()
                .insert(base.name().to_owned(), Definition::TypeDef(alias));
        }
        scope
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// Class and interface bodies, where members are reached through `this`.
    pub fn is_this_context(&self) -> bool {
        matches!(self.kind, ScopeKind::Class | ScopeKind::Interface)
    }

    /// Register `definition` under `name`.
    ///
    /// On redefinition the existing entry is kept and returned as the error.
    pub fn define(&self, name: &str, definition: Definition) -> Result<(), Definition> {
        let mut symbols = self.symbols.borrow_mut();
        if let Some(existing) = symbols.get(name) {
            return Err(existing.clone());
        }
        symbols.insert(name.to_owned(), definition);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Definition> {
        self.symbols.borrow().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.borrow().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.borrow().is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.symbols.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("kind", &self.kind)
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::TypeParameter;

    fn type_param(ids: &IdGen, name: &str) -> Definition {
        Definition::TypeParameter(Rc::new(TypeParameter {
            id: ids.fresh(name),
            location: Location::GENERATED,
        }))
    }

    #[test]
    fn define_then_lookup() {
        let ids = IdGen::new();
        let scope = Scope::new(ScopeKind::Function);
        let t = type_param(&ids, "T");
        assert!(scope.define("T", t.clone()).is_ok());
        assert_eq!(scope.lookup("T").map(|d| d.id().clone()), Some(t.id().clone()));
        assert!(scope.lookup("U").is_none());
    }

    #[test]
    fn redefinition_keeps_first_entry() {
        let ids = IdGen::new();
        let scope = Scope::new(ScopeKind::Module);
        let first = type_param(&ids, "T");
        let second = type_param(&ids, "T");
        assert!(scope.define("T", first.clone()).is_ok());
        let existing = scope.define("T", second);
        assert_eq!(existing.map_err(|d| d.id().clone()), Err(first.id().clone()));
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn base_scope_holds_primitives() {
        let ids = IdGen::new();
        let base = Scope::base(&ids);
        assert_eq!(base.names(), vec!["bool", "char", "float", "int", "str"]);
        assert!(!base.contains("ptr"));
    }

    #[test]
    fn this_context_kinds() {
        assert!(Scope::new(ScopeKind::Class).is_this_context());
        assert!(Scope::new(ScopeKind::Interface).is_this_context());
        assert!(!Scope::new(ScopeKind::Struct).is_this_context());
    }
}
