//! Database access layer.
//!
//! - `driver`: the blocking `Driver` / `Connection` / `Cursor` seam
//! - `connection`: profile resolution, connection strings, sessions
//! - `executor`: phased execution on the blocking pool
//! - `odbc`: the `odbc-api` backend (feature `odbc`)

pub mod connection;
pub mod driver;
pub mod executor;
#[cfg(feature = "odbc")]
pub mod odbc;

/// Whether this build carries the `odbc-api` backend.
pub const ODBC_ENABLED: bool = cfg!(feature = "odbc");

pub use connection::{ConnectionString, Connector, DEFAULT_CONNECT_TIMEOUT_SECS, Session};
pub use driver::{Connection, Cursor, DisabledDriver, Driver};
pub use executor::{Mutation, QueryExecutor};
#[cfg(feature = "odbc")]
pub use odbc::OdbcDriver;
