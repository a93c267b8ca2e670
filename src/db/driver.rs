//! Blocking driver seam.
//!
//! The shape follows the classic DB-API: a driver hands out connections, a
//! connection hands out cursors, and cursors run statements. Every method
//! blocks; callers are expected to run them on the blocking thread pool.

use crate::error::{DbError, DbResult};
use crate::models::{ColumnInfo, RowSet, SqlValue};

/// Opens connections from an ODBC-style connection string.
pub trait Driver: Send + Sync {
    /// Open a connection with autocommit disabled.
    fn connect(&self, connection_string: &str) -> DbResult<Box<dyn Connection>>;
}

/// An open connection with an explicit transaction.
pub trait Connection: Send {
    fn cursor(&mut self) -> DbResult<Box<dyn Cursor>>;

    fn commit(&mut self) -> DbResult<()>;

    fn rollback(&mut self) -> DbResult<()>;

    fn close(self: Box<Self>) -> DbResult<()>;
}

/// Statement execution and catalog access on a connection.
pub trait Cursor: Send {
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<()>;

    /// Execute `sql` once per parameter row.
    fn execute_many(&mut self, sql: &str, rows: &[Vec<SqlValue>]) -> DbResult<()>;

    /// Rows affected by the last statement, or `-1` when the driver did not say.
    fn row_count(&self) -> i64;

    /// Drain the result set of the last statement.
    fn fetch_all(&mut self) -> DbResult<RowSet>;

    /// Catalog lookup of a table's columns (`SQLColumns`).
    fn columns(&mut self, table: &str, schema: Option<&str>) -> DbResult<Vec<ColumnInfo>>;

    /// Catalog lookup of base table names (`SQLTables`).
    fn tables(&mut self, schema: Option<&str>) -> DbResult<Vec<String>>;

    fn close(self: Box<Self>) -> DbResult<()>;
}

/// Stand-in used when the binary was built without a real driver backend.
#[derive(Debug, Clone)]
pub struct DisabledDriver {
    reason: String,
}

impl DisabledDriver {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Driver for DisabledDriver {
    fn connect(&self, _connection_string: &str) -> DbResult<Box<dyn Connection>> {
        Err(DbError::connection(
            self.reason.clone(),
            "Rebuild with `--features odbc` and make sure an ODBC driver manager is installed",
        ))
    }
}
