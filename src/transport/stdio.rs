//! Stdio transport for the MCP server.
//!
//! JSON-RPC messages arrive on stdin and responses leave on stdout, so all
//! logging must go to stderr.

use crate::db::Connector;
use crate::error::{DbError, DbResult};
use crate::mcp::OdbcService;
use crate::transport::{Transport, wait_for_signal};
use rmcp::{ServiceExt, transport::stdio};
use tracing::{info, warn};

pub struct StdioTransport {
    connector: Connector,
}

impl StdioTransport {
    pub fn new(connector: Connector) -> Self {
        Self { connector }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> DbResult<()> {
        info!("Starting MCP server with stdio transport");

        let service = OdbcService::new(self.connector.clone());
        let running_service = service
            .serve(stdio())
            .await
            .map_err(|e| DbError::internal(format!("Failed to start stdio transport: {}", e)))?;

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => info!("Stdio transport completed normally"),
                    Err(e) => {
                        warn!(error = %e, "Stdio transport error");
                        return Err(DbError::internal(format!("Stdio transport error: {}", e)));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received");
                true
            }
        };

        if shutdown_requested {
            // A blocking stdin read cannot be interrupted by select!, so exit here.
            info!("Exiting process");
            std::process::exit(0);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DisabledDriver;
    use crate::store::{JsonFileProfileStore, MemorySecretStore};
    use std::sync::Arc;

    #[test]
    fn test_stdio_transport_creation() {
        let connector = Connector::new(
            Arc::new(JsonFileProfileStore::new("profiles.json")),
            Arc::new(MemorySecretStore::new()),
            Arc::new(DisabledDriver::new("test")),
        );
        let transport = StdioTransport::new(connector);
        assert_eq!(transport.name(), "stdio");
    }
}
