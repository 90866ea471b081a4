//! Definition identities.
//!
//! Every definition is named by an [`Id`]: a display name paired with a
//! number minted by the run-wide [`IdGen`]. Two ids are the same definition
//! exactly when their numbers agree; names only matter for display, so
//! shadowing and names reused by lowering never collide.

use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Identity of a definition.
#[derive(Clone)]
pub struct Id {
    name: Rc<str>,
    number: u64,
}

impl Id {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn number(&self) -> u64 {
        self.number
    }
}

impl PartialEq for Id {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
    }
}

impl Eq for Id {}

impl Hash for Id {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.number.hash(state);
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.number)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The single id counter of a compilation run.
///
/// Shared by reference between every pass of the run, including the lowering
/// phases that synthesize new definitions.
#[derive(Debug, Default)]
pub struct IdGen {
    next: Cell<u64>,
}

impl IdGen {
    pub fn new() -> Self {
        IdGen::default()
    }

    /// Mint a fresh id.
    pub fn fresh(&self, name: &str) -> Id {
        let number = self.next.get();
        self.next.set(number + 1);
        Id {
            name: Rc::from(name),
            number,
        }
    }

    /// Mint a fresh id reusing `id`'s display name.
    pub fn renamed(&self, id: &Id) -> Id {
        let number = self.next.get();
        self.next.set(number + 1);
        Id {
            name: Rc::clone(&id.name),
            number,
        }
    }

    /// Number of ids minted so far.
    pub fn count(&self) -> u64 {
        self.next.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn same_name_different_identity() {
        let ids = IdGen::new();
        let a = ids.fresh("x");
        let b = ids.fresh("x");
        assert_ne!(a, b);
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn clones_share_identity() {
        let ids = IdGen::new();
        let a = ids.fresh("value");
        let set: FxHashSet<Id> = [a.clone(), a.clone()].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn renamed_keeps_display_name() {
        let ids = IdGen::new();
        let a = ids.fresh("T");
        let b = ids.renamed(&a);
        assert_eq!(b.to_string(), "T");
        assert_ne!(a, b);
        assert_eq!(ids.count(), 2);
    }
}
