//! ORDER BY and OFFSET/FETCH compilation.
//!
//! SQL Server only accepts `OFFSET ... ROWS` / `FETCH NEXT ... ROWS ONLY`
//! after an ORDER BY, and FETCH must be preceded by OFFSET.

use crate::error::{DbError, DbResult};
use crate::sql::ident::{self, IdentKind};
use serde_json::{Map, Value as JsonValue};

/// Order clause used when the caller paginates without choosing an order.
pub const NEUTRAL_ORDER: &str = "ORDER BY (SELECT NULL)";

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    /// Parse a direction, ignoring case.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("ASC") {
            Some(Self::Asc)
        } else if raw.eq_ignore_ascii_case("DESC") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Compile `{"Name": "asc", "Created": "DESC"}` into `ORDER BY [Name] ASC, [Created] DESC`.
///
/// Returns `None` for an empty mapping.
pub fn compile_order(order_by: &Map<String, JsonValue>) -> DbResult<Option<String>> {
    let mut parts = Vec::with_capacity(order_by.len());
    for (column, direction) in order_by {
        let quoted = ident::quote(column, IdentKind::OrderColumn)?;
        let direction = match direction {
            JsonValue::String(raw) => {
                Direction::parse(raw).ok_or_else(|| DbError::invalid_direction(column, raw))?
            }
            other => return Err(DbError::invalid_direction(column, other.to_string())),
        };
        parts.push(format!("{quoted} {}", direction.as_sql()));
    }

    if parts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(format!("ORDER BY {}", parts.join(", "))))
    }
}

/// OFFSET / FETCH fragments, either of which may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    pub offset: Option<String>,
    pub fetch: Option<String>,
}

impl Pagination {
    pub fn is_empty(&self) -> bool {
        self.offset.is_none() && self.fetch.is_none()
    }
}

/// Compile limit/offset. Both need an ORDER BY to already be in place.
pub fn compile_pagination(
    limit: Option<u64>,
    offset: Option<u64>,
    has_order: bool,
) -> DbResult<Pagination> {
    let mut pagination = Pagination::default();

    if let Some(offset) = offset {
        if !has_order {
            return Err(DbError::MissingOrderBy { clause: "OFFSET" });
        }
        pagination.offset = Some(format!("OFFSET {offset} ROWS"));
    }

    if let Some(limit) = limit {
        if !has_order {
            return Err(DbError::MissingOrderBy {
                clause: "FETCH NEXT",
            });
        }
        if pagination.offset.is_none() {
            pagination.offset = Some("OFFSET 0 ROWS".to_string());
        }
        pagination.fetch = Some(format!("FETCH NEXT {limit} ROWS ONLY"));
    }

    Ok(pagination)
}
