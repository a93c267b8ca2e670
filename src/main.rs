//! ODBC MCP Server - Main entry point.
//!
//! Serves the MCP tools over stdio or HTTP, or runs a one-shot `profile`
//! command for provisioning connection profiles outside any MCP session.

use clap::Parser;
use odbc_mcp_server::config::{Command, Config, ProfileCommand, TransportMode};
use odbc_mcp_server::db::{Connector, Driver, ODBC_ENABLED};
use odbc_mcp_server::store::{JsonFileProfileStore, KeyringSecretStore};
use odbc_mcp_server::tools::{
    AddProfileInput, ProfileStatus, ProfileToolHandler, RemoveProfileInput,
};
use odbc_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use serde::Serialize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber. Logs go to stderr; stdout belongs to the protocol.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[cfg(feature = "odbc")]
fn default_driver() -> Arc<dyn Driver> {
    Arc::new(odbc_mcp_server::db::OdbcDriver::new())
}

#[cfg(not(feature = "odbc"))]
fn default_driver() -> Arc<dyn Driver> {
    Arc::new(odbc_mcp_server::db::DisabledDriver::new(
        "This build has no ODBC support",
    ))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn read_password_line() -> Result<String, Box<dyn std::error::Error>> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn run_profile_command(
    handler: ProfileToolHandler,
    action: ProfileCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = match action {
        ProfileCommand::List => {
            let output = handler.list_profiles().await?;
            return print_json(&output);
        }
        ProfileCommand::Add {
            name,
            driver,
            server,
            database,
            username,
        } => {
            eprintln!("Enter password for profile '{name}' (user: {username}) on one line:");
            let password = read_password_line().await?;
            handler
                .add_profile(AddProfileInput {
                    profile_name: name,
                    driver,
                    server,
                    database,
                    username,
                    password,
                })
                .await
        }
        ProfileCommand::Remove { name } => {
            handler
                .remove_profile(RemoveProfileInput { profile_name: name })
                .await
        }
    };

    print_json(&output)?;
    if output.status != ProfileStatus::Success {
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_tracing(&config);

    let profiles_path = config.profiles_path();
    let profiles = Arc::new(JsonFileProfileStore::new(&profiles_path));
    let secrets = Arc::new(KeyringSecretStore::new(&config.keyring_service));

    if let Some(Command::Profile { action }) = config.command {
        let handler = ProfileToolHandler::new(profiles, secrets);
        return run_profile_command(handler, action).await;
    }

    info!(
        transport = %config.transport,
        profiles = %profiles_path.display(),
        keyring_service = %config.keyring_service,
        "Starting ODBC MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    if !ODBC_ENABLED {
        warn!("Built without the `odbc` feature: table and schema tools will fail to connect");
    }

    let connector = Connector::new(profiles, secrets, default_driver())
        .with_connect_timeout(config.connect_timeout);

    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            StdioTransport::new(connector).run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            HttpTransport::new(
                connector,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            )
            .run()
            .await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
