//! Configuration handling for the ODBC MCP Server.
//!
//! This module provides configuration management via CLI arguments and environment variables.

use crate::db::DEFAULT_CONNECT_TIMEOUT_SECS;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";
pub const DEFAULT_KEYRING_SERVICE: &str = "odbc-mcp-server";
pub const PROFILES_FILE_NAME: &str = "profiles.json";

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// Streamable HTTP (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Configuration for the ODBC MCP Server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "odbc-mcp-server",
    about = "MCP server for ODBC databases - lets AI assistants read and modify SQL Server tables",
    version,
    author
)]
pub struct Config {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Profile file location. Default: <config dir>/odbc-mcp-server/profiles.json
    #[arg(long, value_name = "PATH", env = "MCP_PROFILES_FILE")]
    pub profiles_file: Option<PathBuf>,

    /// Keychain service name passwords are stored under
    #[arg(
        long,
        default_value = DEFAULT_KEYRING_SERVICE,
        env = "MCP_KEYRING_SERVICE"
    )]
    pub keyring_service: String,

    /// Login timeout passed to the ODBC driver, in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS,
        env = "MCP_CONNECT_TIMEOUT"
    )]
    pub connect_timeout: u64,

    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_HTTP_HOST,
        env = "MCP_HTTP_HOST"
    )]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(
        long,
        default_value_t = DEFAULT_HTTP_PORT,
        env = "MCP_HTTP_PORT"
    )]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_MCP_ENDPOINT,
        env = "MCP_ENDPOINT"
    )]
    pub mcp_endpoint: String,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,
}

/// Out-of-band commands that run instead of the server.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Manage saved connection profiles
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProfileCommand {
    /// Add or update a profile. The password is read from the first line of stdin.
    Add {
        /// Profile name
        name: String,
        /// ODBC driver name, e.g. "{ODBC Driver 18 for SQL Server}"
        #[arg(long)]
        driver: String,
        #[arg(long)]
        server: String,
        #[arg(long)]
        database: String,
        #[arg(long)]
        username: String,
    },
    /// List saved profile names
    List,
    /// Remove a profile and its password
    Remove {
        /// Profile name
        name: String,
    },
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            command: None,
            profiles_file: None,
            keyring_service: DEFAULT_KEYRING_SERVICE.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Resolved profile file path.
    ///
    /// Falls back to `./profiles.json` when the platform has no config directory.
    pub fn profiles_path(&self) -> PathBuf {
        if let Some(path) = &self.profiles_file {
            return path.clone();
        }
        dirs::config_dir()
            .map(|dir| dir.join("odbc-mcp-server").join(PROFILES_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(PROFILES_FILE_NAME))
    }
}
