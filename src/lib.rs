//! ODBC MCP Server Library
//!
//! MCP (Model Context Protocol) tools that let AI assistants read and modify
//! tables in a SQL Server database reached through ODBC, using saved
//! connection profiles whose passwords live in the OS keychain.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod sql;
pub mod store;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::OdbcService;
