//! offline-shell server entry point.
//!
//! Loads configuration, installs and activates the shell, then serves MCP on
//! stdio. Logging goes to stderr to avoid interfering with the JSON-RPC
//! protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use offshell_client::{FetchClient, FetchConfig, OfflineShell, ShellConfig};
use offshell_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.version, origin = %config.origin, db = %config.db_path.display(), "starting offline-shell on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(FetchConfig::from(&config))?;
    let shell = Arc::new(OfflineShell::new(ShellConfig::from_app(&config)?, db, network));

    match shell.start().await {
        Ok(phase) => tracing::info!(%phase, "shell started"),
        Err(e) => match shell.serving_version().await {
            Some(version) => tracing::error!(%version, "install failed, previous version keeps serving: {}", e),
            None => tracing::error!("shell not installed, requests bypass the cache: {}", e),
        },
    }

    let handler = handler::McpShellServer::new(shell.clone());
    let server = serve_server(handler, stdio()).await?;
    server.waiting().await?;

    shell.flush_writes().await;

    Ok(())
}
