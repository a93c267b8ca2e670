//! Query execution engine.
//!
//! Every tool call walks the same phases:
//!
//! 1. **Connect**: resolve profile and password, open a connection and cursor.
//! 2. **Execute**: run the compiled statement.
//! 3. **Commit / Rollback**: mutations only. A commit failure is handled like
//!    an execute failure. Rollback is attempted once and its own failure is
//!    logged, never surfaced.
//! 4. **Release**: close cursor then connection, on every path.
//!
//! Each phase is one `spawn_blocking` hop; the driver never runs on a runtime
//! worker thread.

use crate::db::connection::{Connector, Session};
use crate::db::driver::Cursor;
use crate::error::{DbError, DbResult};
use crate::models::{ColumnInfo, RowSet};
use crate::sql::{CompiledBatch, CompiledQuery};
use std::time::Instant;
use tracing::{debug, info};

/// A statement that changes data.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// UPDATE or DELETE, executed once.
    Single(CompiledQuery),
    /// INSERT, executed once per parameter row.
    Batch(CompiledBatch),
}

/// Runs compiled statements against a profile's database.
#[derive(Clone)]
pub struct QueryExecutor {
    connector: Connector,
}

impl QueryExecutor {
    pub fn new(connector: Connector) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &Connector {
        &self.connector
    }

    /// Execute a SELECT and return every row.
    pub async fn read(&self, profile: &str, query: CompiledQuery) -> DbResult<RowSet> {
        debug!(profile = %profile, sql = %query.sql, params = query.params.len(), "Executing read");
        self.run(profile, false, move |cursor| {
            cursor.execute(&query.sql, &query.params)?;
            cursor.fetch_all()
        })
        .await
    }

    /// Execute a mutation inside a transaction and return the affected row count.
    ///
    /// Batches report the number of parameter rows submitted. Single statements
    /// report the driver's row count, with "unknown" (`-1`) reported as `0`.
    pub async fn mutate(&self, profile: &str, mutation: Mutation) -> DbResult<u64> {
        self.run(profile, true, move |cursor| match mutation {
            Mutation::Single(query) => {
                debug!(sql = %query.sql, params = query.params.len(), "Executing mutation");
                cursor.execute(&query.sql, &query.params)?;
                Ok(u64::try_from(cursor.row_count()).unwrap_or(0))
            }
            Mutation::Batch(batch) => {
                debug!(sql = %batch.sql, rows = batch.rows.len(), "Executing batch");
                cursor.execute_many(&batch.sql, &batch.rows)?;
                Ok(batch.rows.len() as u64)
            }
        })
        .await
    }

    /// Column metadata for a table.
    pub async fn columns(
        &self,
        profile: &str,
        table: &str,
        schema: Option<&str>,
    ) -> DbResult<Vec<ColumnInfo>> {
        let table = table.to_string();
        let schema = schema.map(str::to_string);
        self.run(profile, false, move |cursor| {
            cursor.columns(&table, schema.as_deref())
        })
        .await
    }

    /// Names of the base tables, optionally limited to one schema.
    pub async fn tables(&self, profile: &str, schema: Option<&str>) -> DbResult<Vec<String>> {
        let schema = schema.map(str::to_string);
        self.run(profile, false, move |cursor| cursor.tables(schema.as_deref()))
            .await
    }

    async fn run<T, F>(&self, profile: &str, transactional: bool, work: F) -> DbResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn Cursor) -> DbResult<T> + Send + 'static,
    {
        let start = Instant::now();

        let connector = self.connector.clone();
        let name = profile.to_string();
        let session = blocking(move || connector.open_session(&name)).await??;

        let (mut session, mut outcome) = blocking(move || {
            let mut session = session;
            let outcome = work(session.cursor());
            (session, outcome)
        })
        .await?;

        if transactional {
            (session, outcome) = blocking(move || {
                let outcome = finish_transaction(&mut session, outcome);
                (session, outcome)
            })
            .await?;
        }

        blocking(move || session.release()).await?;

        info!(
            profile = %profile,
            success = outcome.is_ok(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Database call finished"
        );
        outcome
    }
}

/// Commit on success; roll back once on execute or commit failure.
fn finish_transaction<T>(session: &mut Session, outcome: DbResult<T>) -> DbResult<T> {
    match outcome {
        Ok(value) => match session.commit() {
            Ok(()) => Ok(value),
            Err(e) => {
                session.rollback_quietly();
                Err(e)
            }
        },
        Err(e) => {
            session.rollback_quietly();
            Err(e)
        }
    }
}

/// Run a blocking phase on the blocking pool.
pub(crate) async fn blocking<T, F>(f: F) -> DbResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DbError::internal(format!("blocking task failed: {e}")))
}
