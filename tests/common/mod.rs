//! Shared fixtures for integration tests.
//!
//! `MockDriver` records every call the executor makes and can fail any phase
//! on demand, so transaction and release behavior can be checked without a
//! live SQL Server.

#![allow(dead_code)]

use odbc_mcp_server::db::{Connection, Connector, Cursor, Driver, QueryExecutor};
use odbc_mcp_server::error::{DbError, DbResult};
use odbc_mcp_server::models::{ColumnInfo, ConnectionProfile, RowSet, SqlValue, StoredProfile};
use odbc_mcp_server::store::{
    JsonFileProfileStore, MemorySecretStore, ProfileStore, SecretKey, SecretStore,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::TempDir;

pub const PROFILE: &str = "test_db";
pub const USERNAME: &str = "app_user";
pub const PASSWORD: &str = "s3cret;pw";

/// Phase at which the mock should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailAt {
    Connect,
    Cursor,
    Execute,
    Commit,
    Rollback,
    CursorClose,
    ConnectionClose,
}

/// Everything the mock has observed.
#[derive(Debug, Clone, Default)]
pub struct Calls {
    pub connection_strings: Vec<String>,
    pub executed: Vec<(String, Vec<SqlValue>)>,
    pub batches: Vec<(String, Vec<Vec<SqlValue>>)>,
    pub column_lookups: Vec<(String, Option<String>)>,
    pub table_lookups: Vec<Option<String>>,
    pub commits: usize,
    pub rollbacks: usize,
    pub cursor_closes: usize,
    pub connection_closes: usize,
}

impl Calls {
    pub fn connects(&self) -> usize {
        self.connection_strings.len()
    }
}

#[derive(Debug, Default)]
struct Behavior {
    failures: HashSet<FailAt>,
    result: RowSet,
    row_count: i64,
    columns: Vec<ColumnInfo>,
    tables: Vec<String>,
}

#[derive(Debug, Default)]
struct Shared {
    calls: Mutex<Calls>,
    behavior: Mutex<Behavior>,
}

impl Shared {
    fn calls(&self) -> MutexGuard<'_, Calls> {
        self.calls.lock().unwrap()
    }

    fn behavior(&self) -> MutexGuard<'_, Behavior> {
        self.behavior.lock().unwrap()
    }

    fn check(&self, phase: FailAt) -> DbResult<()> {
        if self.behavior().failures.contains(&phase) {
            Err(DbError::database(
                format!("injected {phase:?} failure"),
                Some("HY000".to_string()),
                "mock",
            ))
        } else {
            Ok(())
        }
    }
}

/// A driver that records calls instead of talking to a database.
#[derive(Debug, Default, Clone)]
pub struct MockDriver {
    shared: Arc<Shared>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_at(&self, phase: FailAt) -> &Self {
        self.shared.behavior().failures.insert(phase);
        self
    }

    pub fn set_result(&self, result: RowSet) -> &Self {
        self.shared.behavior().result = result;
        self
    }

    pub fn set_row_count(&self, row_count: i64) -> &Self {
        self.shared.behavior().row_count = row_count;
        self
    }

    pub fn set_columns(&self, columns: Vec<ColumnInfo>) -> &Self {
        self.shared.behavior().columns = columns;
        self
    }

    pub fn set_tables(&self, tables: Vec<String>) -> &Self {
        self.shared.behavior().tables = tables;
        self
    }

    /// Snapshot of the calls seen so far.
    pub fn calls(&self) -> Calls {
        self.shared.calls().clone()
    }
}

impl Driver for MockDriver {
    fn connect(&self, connection_string: &str) -> DbResult<Box<dyn Connection>> {
        self.shared
            .calls()
            .connection_strings
            .push(connection_string.to_string());
        self.shared.check(FailAt::Connect)?;
        Ok(Box::new(MockConnection {
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct MockConnection {
    shared: Arc<Shared>,
}

impl Connection for MockConnection {
    fn cursor(&mut self) -> DbResult<Box<dyn Cursor>> {
        self.shared.check(FailAt::Cursor)?;
        Ok(Box::new(MockCursor {
            shared: Arc::clone(&self.shared),
            row_count: -1,
        }))
    }

    fn commit(&mut self) -> DbResult<()> {
        self.shared.calls().commits += 1;
        self.shared.check(FailAt::Commit)
    }

    fn rollback(&mut self) -> DbResult<()> {
        self.shared.calls().rollbacks += 1;
        self.shared.check(FailAt::Rollback)
    }

    fn close(self: Box<Self>) -> DbResult<()> {
        self.shared.calls().connection_closes += 1;
        self.shared.check(FailAt::ConnectionClose)
    }
}

struct MockCursor {
    shared: Arc<Shared>,
    row_count: i64,
}

impl Cursor for MockCursor {
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<()> {
        self.shared
            .calls()
            .executed
            .push((sql.to_string(), params.to_vec()));
        self.shared.check(FailAt::Execute)?;
        self.row_count = self.shared.behavior().row_count;
        Ok(())
    }

    fn execute_many(&mut self, sql: &str, rows: &[Vec<SqlValue>]) -> DbResult<()> {
        self.shared
            .calls()
            .batches
            .push((sql.to_string(), rows.to_vec()));
        self.shared.check(FailAt::Execute)?;
        self.row_count = -1;
        Ok(())
    }

    fn row_count(&self) -> i64 {
        self.row_count
    }

    fn fetch_all(&mut self) -> DbResult<RowSet> {
        Ok(self.shared.behavior().result.clone())
    }

    fn columns(&mut self, table: &str, schema: Option<&str>) -> DbResult<Vec<ColumnInfo>> {
        self.shared
            .calls()
            .column_lookups
            .push((table.to_string(), schema.map(str::to_string)));
        self.shared.check(FailAt::Execute)?;
        Ok(self.shared.behavior().columns.clone())
    }

    fn tables(&mut self, schema: Option<&str>) -> DbResult<Vec<String>> {
        self.shared
            .calls()
            .table_lookups
            .push(schema.map(str::to_string));
        self.shared.check(FailAt::Execute)?;
        Ok(self.shared.behavior().tables.clone())
    }

    fn close(self: Box<Self>) -> DbResult<()> {
        self.shared.calls().cursor_closes += 1;
        self.shared.check(FailAt::CursorClose)
    }
}

/// A connector wired to the mock driver, a temp profile file and an in-memory
/// secret store seeded with one complete profile.
pub struct Fixture {
    pub driver: MockDriver,
    pub profiles: Arc<JsonFileProfileStore>,
    pub secrets: Arc<MemorySecretStore>,
    pub connector: Connector,
    _dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let fixture = Self::empty();
        fixture.seed_profile(PROFILE, USERNAME, PASSWORD);
        fixture
    }

    /// No profiles and no secrets.
    pub fn empty() -> Self {
        let dir = TempDir::new().unwrap();
        let profiles = Arc::new(JsonFileProfileStore::new(dir.path().join("profiles.json")));
        let secrets = Arc::new(MemorySecretStore::new());
        let driver = MockDriver::new();
        let connector = Connector::new(
            profiles.clone(),
            secrets.clone(),
            Arc::new(driver.clone()),
        );
        Self {
            driver,
            profiles,
            secrets,
            connector,
            _dir: dir,
        }
    }

    pub fn seed_profile(&self, name: &str, username: &str, password: &str) {
        let profile = ConnectionProfile::new(
            name,
            "{ODBC Driver 18 for SQL Server}",
            "db.internal,1433",
            "Sales",
            username,
        );
        self.profiles
            .upsert(name, StoredProfile::from(&profile))
            .unwrap();
        self.secrets
            .set(&SecretKey::new(name, username), password)
            .unwrap();
    }

    pub fn executor(&self) -> Arc<QueryExecutor> {
        Arc::new(QueryExecutor::new(self.connector.clone()))
    }
}

pub fn map(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().unwrap()
}
