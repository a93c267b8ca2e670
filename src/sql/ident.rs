//! Bare identifier validation.
//!
//! Table, schema and column names are the only caller-supplied text that is
//! ever interpolated into SQL. They must match `[A-Za-z_][A-Za-z0-9_]*` and
//! are then wrapped in SQL Server brackets.

use crate::error::{DbError, DbResult};

/// What an identifier names, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentKind {
    Table,
    Schema,
    Column,
    FilterColumn,
    UpdateColumn,
    OrderColumn,
    Profile,
}

impl IdentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Schema => "schema",
            Self::Column => "column",
            Self::FilterColumn => "filter column",
            Self::UpdateColumn => "update column",
            Self::OrderColumn => "order_by column",
            Self::Profile => "profile",
        }
    }
}

pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate `name` as a bare identifier.
pub fn validate(name: &str, kind: IdentKind) -> DbResult<&str> {
    if is_valid_identifier(name) {
        Ok(name)
    } else {
        Err(DbError::invalid_identifier(kind.as_str(), name))
    }
}

/// Validate and bracket-quote an identifier: `Name` -> `[Name]`.
pub fn quote(name: &str, kind: IdentKind) -> DbResult<String> {
    validate(name, kind).map(|n| format!("[{n}]"))
}
