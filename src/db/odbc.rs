//! `odbc-api` backend.
//!
//! Result sets are fetched eagerly as text: every non-NULL cell comes back as
//! `SqlValue::Text`, which keeps the backend independent of the column types
//! a particular driver reports.

use crate::db::driver::{Connection, Cursor, Driver};
use crate::error::{DbError, DbResult};
use crate::models::{ColumnInfo, RowSet, SqlValue};
use odbc_api::buffers::TextRowSet;
use odbc_api::parameter::{InputParameter, VarCharBox};
use odbc_api::{Bit, ConnectionOptions, Cursor as _, Environment, ResultSetMetadata};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tracing::debug;

/// Rows fetched per round trip.
const FETCH_BATCH_SIZE: usize = 256;
/// Upper bound for a single text cell, in bytes.
const MAX_TEXT_LEN: usize = 8192;

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

fn environment() -> DbResult<&'static Environment> {
    if let Some(env) = ENVIRONMENT.get() {
        return Ok(env);
    }
    let env = Environment::new().map_err(|e| {
        DbError::connection(
            format!("Failed to initialize the ODBC environment: {e}"),
            "Check that an ODBC driver manager (unixODBC or the Windows ODBC stack) is installed",
        )
    })?;
    Ok(ENVIRONMENT.get_or_init(|| env))
}

/// Driver that opens connections through the system ODBC driver manager.
#[derive(Debug, Default, Clone, Copy)]
pub struct OdbcDriver;

impl OdbcDriver {
    pub fn new() -> Self {
        Self
    }
}

impl Driver for OdbcDriver {
    fn connect(&self, connection_string: &str) -> DbResult<Box<dyn Connection>> {
        let env = environment()?;
        let conn = env
            .connect_with_connection_string(connection_string, ConnectionOptions::default())
            .map_err(connect_error)?;
        conn.set_autocommit(false).map_err(statement_error)?;
        debug!("ODBC connection opened");
        Ok(Box::new(OdbcConnection {
            inner: Arc::new(Mutex::new(conn)),
        }))
    }
}

type SharedConnection = Arc<Mutex<odbc_api::Connection<'static>>>;

fn lock(conn: &SharedConnection) -> MutexGuard<'_, odbc_api::Connection<'static>> {
    conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct OdbcConnection {
    inner: SharedConnection,
}

impl Connection for OdbcConnection {
    fn cursor(&mut self) -> DbResult<Box<dyn Cursor>> {
        Ok(Box::new(OdbcCursor {
            conn: Arc::clone(&self.inner),
            pending: None,
            row_count: -1,
        }))
    }

    fn commit(&mut self) -> DbResult<()> {
        lock(&self.inner).commit().map_err(statement_error)
    }

    fn rollback(&mut self) -> DbResult<()> {
        lock(&self.inner).rollback().map_err(statement_error)
    }

    fn close(self: Box<Self>) -> DbResult<()> {
        // The handle is freed when the last reference goes away.
        drop(self.inner);
        Ok(())
    }
}

struct OdbcCursor {
    conn: SharedConnection,
    pending: Option<RowSet>,
    row_count: i64,
}

impl OdbcCursor {
    fn run(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<()> {
        let params = bind_params(params)?;
        let guard = lock(&self.conn);
        let mut statement = guard.preallocate().map_err(statement_error)?;

        self.pending = match statement
            .execute(sql, params.as_slice())
            .map_err(statement_error)?
        {
            Some(cursor) => Some(read_text_rows(cursor)?),
            None => None,
        };
        self.row_count = statement
            .row_count()
            .map_err(statement_error)?
            .and_then(|n| i64::try_from(n).ok())
            .unwrap_or(-1);
        Ok(())
    }
}

impl Cursor for OdbcCursor {
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<()> {
        self.run(sql, params)
    }

    fn execute_many(&mut self, sql: &str, rows: &[Vec<SqlValue>]) -> DbResult<()> {
        let mut total = 0i64;
        for row in rows {
            self.run(sql, row)?;
            total += self.row_count.max(0);
        }
        self.row_count = total;
        self.pending = None;
        Ok(())
    }

    fn row_count(&self) -> i64 {
        self.row_count
    }

    fn fetch_all(&mut self) -> DbResult<RowSet> {
        Ok(self.pending.take().unwrap_or_default())
    }

    fn columns(&mut self, table: &str, schema: Option<&str>) -> DbResult<Vec<ColumnInfo>> {
        let guard = lock(&self.conn);
        let catalog = guard.current_catalog().map_err(statement_error)?;
        let cursor = guard
            .columns(&catalog, schema.unwrap_or("%"), table, "%")
            .map_err(statement_error)?;
        let rows = read_text_rows(cursor)?;
        rows.rows.iter().map(|row| column_info(row)).collect()
    }

    fn tables(&mut self, schema: Option<&str>) -> DbResult<Vec<String>> {
        let guard = lock(&self.conn);
        let catalog = guard.current_catalog().map_err(statement_error)?;
        let cursor = guard
            .tables(&catalog, schema.unwrap_or("%"), "%", "TABLE")
            .map_err(statement_error)?;
        let rows = read_text_rows(cursor)?;
        // SQLTables: TABLE_CAT, TABLE_SCHEM, TABLE_NAME, TABLE_TYPE, REMARKS
        Ok(rows
            .rows
            .into_iter()
            .filter_map(|mut row| match row.get_mut(2) {
                Some(SqlValue::Text(name)) => Some(std::mem::take(name)),
                _ => None,
            })
            .collect())
    }

    fn close(self: Box<Self>) -> DbResult<()> {
        Ok(())
    }
}

fn bind_params(params: &[SqlValue]) -> DbResult<Vec<Box<dyn InputParameter>>> {
    params
        .iter()
        .map(|value| {
            let param: Box<dyn InputParameter> = match value {
                SqlValue::Null => Box::new(VarCharBox::null()),
                SqlValue::Bool(b) => Box::new(Bit::from_bool(*b)),
                SqlValue::Int(i) => Box::new(*i),
                SqlValue::Float(f) => Box::new(*f),
                SqlValue::Text(s) => Box::new(VarCharBox::from_string(s.clone())),
                SqlValue::List(_) => {
                    return Err(DbError::internal(
                        "list values must be expanded before binding",
                    ));
                }
            };
            Ok(param)
        })
        .collect()
}

fn read_text_rows(mut cursor: impl odbc_api::Cursor) -> DbResult<RowSet> {
    let columns = cursor
        .column_names()
        .map_err(statement_error)?
        .collect::<Result<Vec<String>, _>>()
        .map_err(statement_error)?;

    let buffer = TextRowSet::for_cursor(FETCH_BATCH_SIZE, &mut cursor, Some(MAX_TEXT_LEN))
        .map_err(statement_error)?;
    let mut block = cursor.bind_buffer(buffer).map_err(statement_error)?;

    let mut rows = Vec::new();
    while let Some(batch) = block.fetch().map_err(statement_error)? {
        for row in 0..batch.num_rows() {
            let values = (0..batch.num_cols())
                .map(|col| match batch.at(col, row) {
                    Some(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
                    None => SqlValue::Null,
                })
                .collect();
            rows.push(values);
        }
    }

    Ok(RowSet::new(columns, rows))
}

/// Map one `SQLColumns` row.
///
/// Layout: TABLE_CAT, TABLE_SCHEM, TABLE_NAME, COLUMN_NAME, DATA_TYPE,
/// TYPE_NAME, COLUMN_SIZE, BUFFER_LENGTH, DECIMAL_DIGITS, NUM_PREC_RADIX,
/// NULLABLE.
fn column_info(row: &[SqlValue]) -> DbResult<ColumnInfo> {
    let text = |i: usize| match row.get(i) {
        Some(SqlValue::Text(s)) => Some(s.as_str()),
        _ => None,
    };
    let number = |i: usize| text(i).and_then(|s| s.trim().parse::<i64>().ok());

    let table_name = text(2).ok_or_else(|| DbError::internal("SQLColumns row without TABLE_NAME"))?;
    let column_name =
        text(3).ok_or_else(|| DbError::internal("SQLColumns row without COLUMN_NAME"))?;

    Ok(ColumnInfo::new(
        table_name,
        column_name,
        number(4).and_then(|n| i32::try_from(n).ok()).unwrap_or(0),
        text(5).unwrap_or_default(),
    )
    .with_size(number(6), number(8).and_then(|n| i32::try_from(n).ok()))
    .with_nullable(number(10) != Some(0)))
}

fn sql_state(err: &odbc_api::Error) -> Option<String> {
    match err {
        odbc_api::Error::Diagnostics { record, .. } => {
            Some(String::from_utf8_lossy(&record.state.0).into_owned())
        }
        _ => None,
    }
}

fn connect_error(err: odbc_api::Error) -> DbError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    let suggestion = if lower.contains("login failed") || sql_state(&err).as_deref() == Some("28000") {
        "Verify the username and password stored for this profile"
    } else if lower.contains("data source name not found") || lower.contains("can't open lib") {
        "Check that the ODBC driver named in the profile is installed"
    } else if lower.contains("timeout") {
        "Check that the server is reachable and the port is open"
    } else {
        "Check the profile's driver, server and database values"
    };
    DbError::connection(message, suggestion)
}

fn statement_error(err: odbc_api::Error) -> DbError {
    let state = sql_state(&err);
    let suggestion = match state.as_deref() {
        Some("42S02") => "Check that the table exists; use list_tables to see available tables",
        Some("42S22") => "Check the column names; use get_table_schema to see available columns",
        Some("23000") => "The change violates a constraint; check keys and NOT NULL columns",
        Some("22018") | Some("22005") => "A value does not match the column type",
        _ => "Check the table, column names and values",
    };
    DbError::database(err.to_string(), state, suggestion)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_backend_types_cross_threads() {
        assert_send_sync::<SharedConnection>();
        assert_send_sync::<OdbcDriver>();
    }
}
