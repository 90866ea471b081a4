//! Error codes.
//!
//! The first digit names the stage that reports the error:
//! - E1xxx: scope filling, name binding and module ordering
//! - E2xxx: type evaluation and type checking
//! - E3xxx: lowering
//! - E9xxx: internal errors

use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Scope and name errors (E1xxx)
    /// Name defined twice in one scope
    E1001,
    /// Unresolved name or qualified path segment
    E1002,
    /// Import of a missing module or member
    E1003,
    /// Name does not denote a type, or bad type arguments
    E1004,
    /// Modules import each other in a cycle
    E1005,

    // Type errors (E2xxx)
    /// Types do not unify
    E2001,
    /// Wrong number of arguments or payload values
    E2002,
    /// Construction is missing a field
    E2003,
    /// Construction supplies a field twice
    E2004,
    /// Construction supplies a field the type does not have
    E2005,
    /// No such field or method
    E2006,
    /// No such enum variant
    E2007,
    /// Case statement does not cover every variant
    E2008,
    /// Raise, or call of a raising function, without a compatible handler
    E2009,
    /// Call target is neither a function nor a class
    E2010,
    /// For-loop source has no iteration capability
    E2011,
    /// Array indexed with other than one index
    E2012,
    /// Argument label differs from the parameter name
    E2013,
    /// Value cannot be converted to a string
    E2014,
    /// Statement in a sequence does not have type void
    E2015,
    /// Type or module used as a value
    E2016,
    /// Assignment to something that is not a variable, field or element
    E2017,
    /// Case statement handles a variant twice
    E2018,

    // Lowering errors (E3xxx)
    /// Assignment to a defaulted class member
    E3001,
    /// Lowered tree still contains constructs backends cannot handle
    E3002,

    // Internal errors (E9xxx)
    /// Broken invariant inside the compiler
    E9001,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 26] = [
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E1004,
        ErrorCode::E1005,
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E2005,
        ErrorCode::E2006,
        ErrorCode::E2007,
        ErrorCode::E2008,
        ErrorCode::E2009,
        ErrorCode::E2010,
        ErrorCode::E2011,
        ErrorCode::E2012,
        ErrorCode::E2013,
        ErrorCode::E2014,
        ErrorCode::E2015,
        ErrorCode::E2016,
        ErrorCode::E2017,
        ErrorCode::E2018,
        ErrorCode::E3001,
        ErrorCode::E3002,
        ErrorCode::E9001,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E2007 => "E2007",
            ErrorCode::E2008 => "E2008",
            ErrorCode::E2009 => "E2009",
            ErrorCode::E2010 => "E2010",
            ErrorCode::E2011 => "E2011",
            ErrorCode::E2012 => "E2012",
            ErrorCode::E2013 => "E2013",
            ErrorCode::E2014 => "E2014",
            ErrorCode::E2015 => "E2015",
            ErrorCode::E2016 => "E2016",
            ErrorCode::E2017 => "E2017",
            ErrorCode::E2018 => "E2018",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E9001 => "E9001",
        }
    }

    /// One-line explanation of the code.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "redefinition in scope",
            ErrorCode::E1002 => "unresolved name",
            ErrorCode::E1003 => "unresolved import",
            ErrorCode::E1004 => "invalid type expression",
            ErrorCode::E1005 => "import cycle",
            ErrorCode::E2001 => "type mismatch",
            ErrorCode::E2002 => "arity mismatch",
            ErrorCode::E2003 => "missing field",
            ErrorCode::E2004 => "duplicate field",
            ErrorCode::E2005 => "superfluous field",
            ErrorCode::E2006 => "unknown field",
            ErrorCode::E2007 => "unknown variant",
            ErrorCode::E2008 => "uncovered case variant",
            ErrorCode::E2009 => "no compatible exception handler",
            ErrorCode::E2010 => "not callable",
            ErrorCode::E2011 => "not iterable",
            ErrorCode::E2012 => "invalid index arity",
            ErrorCode::E2013 => "argument label mismatch",
            ErrorCode::E2014 => "cannot convert to string",
            ErrorCode::E2015 => "non-void statement in sequence",
            ErrorCode::E2016 => "not a value",
            ErrorCode::E2017 => "invalid assignment target",
            ErrorCode::E2018 => "duplicate case arm",
            ErrorCode::E3001 => "assignment to class constant",
            ErrorCode::E3002 => "construct not lowered",
            ErrorCode::E9001 => "internal compiler error",
        }
    }

    pub fn is_name_error(&self) -> bool {
        self.as_str().starts_with("E1")
    }

    pub fn is_type_error(&self) -> bool {
        self.as_str().starts_with("E2")
    }

    pub fn is_lowering_error(&self) -> bool {
        self.as_str().starts_with("E3")
    }

    pub fn is_internal_error(&self) -> bool {
        matches!(self, ErrorCode::E9001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or(())
    }
}
