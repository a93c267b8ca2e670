//! WHERE clause compilation.
//!
//! Filters arrive as a JSON object keyed by column name:
//!
//! ```json
//! {
//!     "Age": {"operator": ">", "value": 30},
//!     "Status": {"operator": "IN", "value": ["Active", "Pending"]},
//!     "Name": {"operator": "LIKE", "value": "J%"}
//! }
//! ```
//!
//! Conditions are emitted in key order and joined with `AND`. Every value is
//! bound through a `?` placeholder; only validated column names reach the SQL
//! text.

use crate::error::{DbError, DbResult};
use crate::models::SqlValue;
use crate::sql::ident::{self, IdentKind};
use serde_json::{Map, Value as JsonValue};
use tracing::warn;

/// Condition emitted for `IN` with an empty list. SQL Server rejects `IN ()`.
pub const ALWAYS_FALSE: &str = "1 = 0";

/// Comparison operators accepted in a filter entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
    Like,
    In,
}

impl Operator {
    /// Parse an operator, ignoring case.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "=" => Some(Self::Eq),
            ">" => Some(Self::Gt),
            "<" => Some(Self::Lt),
            ">=" => Some(Self::Gte),
            "<=" => Some(Self::Lte),
            "LIKE" => Some(Self::Like),
            "IN" => Some(Self::In),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::In => "IN",
        }
    }
}

/// Conjunctive WHERE fragment with its positional parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    pub conditions: Vec<String>,
    pub params: Vec<SqlValue>,
}

impl WhereClause {
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// `WHERE a AND b`, or `None` when there are no conditions.
    pub fn to_sql(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(format!("WHERE {}", self.conditions.join(" AND ")))
        }
    }

    fn push(&mut self, condition: String, params: impl IntoIterator<Item = SqlValue>) {
        self.conditions.push(condition);
        self.params.extend(params);
    }
}

/// Compile the full filter grammar used by `read_rows`.
pub fn compile_filters(filters: &Map<String, JsonValue>) -> DbResult<WhereClause> {
    let mut clause = WhereClause::default();

    for (column, entry) in filters {
        let quoted = ident::quote(column, IdentKind::FilterColumn)?;
        let (raw_operator, value) = split_entry(column, entry)?;

        let operator = Operator::parse(raw_operator)
            .ok_or_else(|| DbError::unsupported_operator(column, raw_operator.to_ascii_uppercase()))?;

        match operator {
            Operator::In => match SqlValue::from_json(column, value)? {
                SqlValue::List(items) if items.is_empty() => {
                    warn!(
                        column = %column,
                        "Empty list for IN filter; the query will match no rows"
                    );
                    clause.push(ALWAYS_FALSE.to_string(), Vec::new());
                }
                SqlValue::List(items) => {
                    let placeholders = placeholders(items.len());
                    clause.push(format!("{quoted} IN ({placeholders})"), items);
                }
                other => {
                    return Err(DbError::type_mismatch(column, "a list", other.type_name()));
                }
            },
            op => {
                let param = SqlValue::scalar_from_json(column, value)?;
                clause.push(format!("{quoted} {} ?", op.as_sql()), [param]);
            }
        }
    }

    Ok(clause)
}

/// Compile the equality-only `column -> value` form used by update and delete.
pub fn compile_equality_filters(filters: &Map<String, JsonValue>) -> DbResult<WhereClause> {
    let mut clause = WhereClause::default();
    for (column, value) in filters {
        let quoted = ident::quote(column, IdentKind::FilterColumn)?;
        let param = SqlValue::scalar_from_json(column, value)?;
        clause.push(format!("{quoted} = ?"), [param]);
    }
    Ok(clause)
}

/// `?, ?, ?` with `count` placeholders.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Pull `operator` and `value` out of a filter entry, which must have exactly those two keys.
fn split_entry<'a>(column: &str, entry: &'a JsonValue) -> DbResult<(&'a str, &'a JsonValue)> {
    const EXPECTED: &str = "expected {\"operator\": \"...\", \"value\": ...}";

    let JsonValue::Object(fields) = entry else {
        return Err(DbError::malformed_filter(column, EXPECTED));
    };
    if fields.len() != 2 {
        return Err(DbError::malformed_filter(column, EXPECTED));
    }
    let (Some(operator), Some(value)) = (fields.get("operator"), fields.get("value")) else {
        return Err(DbError::malformed_filter(column, EXPECTED));
    };
    let JsonValue::String(operator) = operator else {
        return Err(DbError::malformed_filter(column, "operator must be a string"));
    };
    Ok((operator.as_str(), value))
}
