//! Schema-related data models.
//!
//! This module defines types for database schema introspection.

use schemars::JsonSchema;
use serde::Serialize;

/// One column as reported by the driver's catalog function (`SQLColumns`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ColumnInfo {
    pub table_name: String,
    pub column_name: String,
    /// ODBC SQL data type code (e.g. 4 for INTEGER, 12 for VARCHAR)
    pub data_type_code: i32,
    /// Driver-specific type name (e.g. "int", "nvarchar")
    pub type_name: String,
    pub column_size: Option<i64>,
    pub decimal_digits: Option<i32>,
    pub is_nullable: bool,
}

impl ColumnInfo {
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        data_type_code: i32,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            data_type_code,
            type_name: type_name.into(),
            column_size: None,
            decimal_digits: None,
            is_nullable: true,
        }
    }

    pub fn with_size(mut self, column_size: Option<i64>, decimal_digits: Option<i32>) -> Self {
        self.column_size = column_size;
        self.decimal_digits = decimal_digits;
        self
    }

    pub fn with_nullable(mut self, is_nullable: bool) -> Self {
        self.is_nullable = is_nullable;
        self
    }
}
