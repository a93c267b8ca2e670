//! Data models for the ODBC MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod profile;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use profile::{ConnectionProfile, StoredProfile};
pub use query::{RowSet, SqlValue};
pub use schema::ColumnInfo;
