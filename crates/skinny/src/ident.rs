//! SQL identifier checks for entity and field names.
//!
//! Entity and field names are interpolated into SQL text unquoted, so they are
//! validated against `[A-Za-z_][A-Za-z0-9_]*` before any statement is built.

/// Why a name was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentIssue {
    Empty,
    BadStart(char),
    BadChar(char),
}

impl std::fmt::Display for IdentIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentIssue::Empty => f.write_str("identifier cannot be empty"),
            IdentIssue::BadStart(c) => write!(f, "invalid identifier start character: '{c}'"),
            IdentIssue::BadChar(c) => write!(f, "invalid character in identifier: '{c}'"),
        }
    }
}

/// Check that `name` can be spliced into SQL as a bare identifier.
pub fn check_ident(name: &str) -> Result<(), IdentIssue> {
    let mut chars = name.chars();
    match chars.next() {
        None => return Err(IdentIssue::Empty),
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        Some(c) => return Err(IdentIssue::BadStart(c)),
    }
    for c in chars {
        if !(c == '_' || c.is_ascii_alphanumeric()) {
            return Err(IdentIssue::BadChar(c));
        }
    }
    Ok(())
}

pub fn is_valid_ident(name: &str) -> bool {
    check_ident(name).is_ok()
}
