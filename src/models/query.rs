//! Query-related data models.
//!
//! This module defines the value type bound as a query parameter and the
//! row set returned by the driver.

use crate::error::{DbError, DbResult};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/// A value bound to a `?` placeholder or read back from a result column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    Text(String),
    /// Value list, only valid as the operand of an `IN` filter
    List(Vec<SqlValue>),
}

impl SqlValue {
    /// Convert a scalar JSON value. Arrays and objects are rejected.
    pub fn scalar_from_json(column: &str, value: &JsonValue) -> DbResult<Self> {
        match value {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Bool(b) => Ok(Self::Bool(*b)),
            JsonValue::Number(n) => Ok(match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            }),
            JsonValue::String(s) => Ok(Self::Text(s.clone())),
            other => Err(DbError::type_mismatch(
                column,
                "a scalar value",
                json_type_name(other),
            )),
        }
    }

    /// Convert any JSON value; arrays become a `List` of scalars.
    pub fn from_json(column: &str, value: &JsonValue) -> DbResult<Self> {
        match value {
            JsonValue::Array(items) => items
                .iter()
                .map(|item| Self::scalar_from_json(column, item))
                .collect::<DbResult<Vec<_>>>()
                .map(Self::List),
            other => Self::scalar_from_json(column, other),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name of this value for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::List(_) => "list",
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(i) => JsonValue::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Self::Text(s) => JsonValue::String(s.clone()),
            Self::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for SqlValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

pub(crate) fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "object",
    }
}

/// Rows produced by a cursor, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Zip every row with the column names.
    pub fn into_json_rows(self) -> Vec<Map<String, JsonValue>> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| {
                columns
                    .iter()
                    .zip(row.iter())
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_conversion() {
        assert_eq!(SqlValue::scalar_from_json("c", &json!(30)).unwrap(), SqlValue::Int(30));
        assert_eq!(
            SqlValue::scalar_from_json("c", &json!(1.5)).unwrap(),
            SqlValue::Float(1.5)
        );
        assert_eq!(
            SqlValue::scalar_from_json("c", &json!("J%")).unwrap(),
            SqlValue::from("J%")
        );
        assert!(SqlValue::scalar_from_json("c", &json!(null)).unwrap().is_null());
    }

    #[test]
    fn test_scalar_rejects_object_and_list() {
        let err = SqlValue::scalar_from_json("c", &json!({"a": 1})).unwrap_err();
        assert!(matches!(err, DbError::TypeMismatch { found: "object", .. }));

        let err = SqlValue::scalar_from_json("c", &json!([1])).unwrap_err();
        assert!(matches!(err, DbError::TypeMismatch { found: "list", .. }));
    }

    #[test]
    fn test_list_conversion() {
        assert_eq!(
            SqlValue::from_json("c", &json!(["a", 1])).unwrap(),
            SqlValue::List(vec![SqlValue::from("a"), SqlValue::Int(1)])
        );
    }

    #[test]
    fn test_list_rejects_nested_lists() {
        let err = SqlValue::from_json("c", &json!([1, [2]])).unwrap_err();
        assert!(matches!(err, DbError::TypeMismatch { .. }));
    }

    #[test]
    fn test_row_set_into_json_rows() {
        let rows = RowSet::new(
            vec!["id".to_string(), "name".to_string()],
            vec![vec![SqlValue::Int(1), SqlValue::from("Ada")]],
        );
        assert_eq!(rows.row_count(), 1);
        let json_rows = rows.into_json_rows();
        assert_eq!(json_rows[0]["id"], json!(1));
        assert_eq!(json_rows[0]["name"], json!("Ada"));
    }

    #[test]
    fn test_non_finite_float_serializes_as_null() {
        assert_eq!(SqlValue::Float(f64::NAN).to_json(), JsonValue::Null);
    }
}
