//! Source locations.

use std::fmt;

/// A row/column position in a source module.
///
/// Rows and columns are 1-based; `Location::GENERATED` (0:0) marks nodes
/// synthesized by lowering.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, PartialOrd, Ord)]
pub struct Location {
    pub row: u32,
    pub column: u32,
}

impl Location {
    /// Location used for compiler-generated nodes.
    pub const GENERATED: Location = Location { row: 0, column: 0 };

    #[inline]
    pub const fn new(row: u32, column: u32) -> Self {
        Location { row, column }
    }

    /// Whether this location points into user source.
    #[inline]
    pub const fn is_generated(self) -> bool {
        self.row == 0
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_generated() {
            write!(f, "<generated>")
        } else {
            write!(f, "{}:{}", self.row, self.column)
        }
    }
}
