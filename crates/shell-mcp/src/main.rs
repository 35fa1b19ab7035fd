//! # Shell MCP Server
//!
//! Model Context Protocol server for AI agents to run shell commands with
//! background session tracking.
//!
//! ## Overview
//!
//! This server provides MCP tools for:
//! - Running commands with a completion timeout (execute_command)
//! - Reading and searching accumulated output (read_output)
//! - Listing tracked sessions (list_sessions)
//! - Terminating sessions (force_terminate)
//!
//! ## Architecture
//!
//! This is Layer 1 - the main MCP server binary that ties together:
//! - shell-mcp-core: Core types, config and validation
//! - shell-mcp-session: Session lifecycle, launcher and registry

use rmcp::{transport::stdio, ServiceExt};
use shell_mcp::ShellMcpServer;
use shell_mcp_core::ServerConfig;

fn config_from_args() -> anyhow::Result<ServerConfig> {
    let args: Vec<String> = std::env::args().collect();
    match args.iter().position(|arg| arg == "--config") {
        Some(i) => {
            let path = args
                .get(i + 1)
                .ok_or_else(|| anyhow::anyhow!("--config requires a path argument"))?;
            Ok(ServerConfig::from_file(path)?)
        }
        None => Ok(ServerConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config_from_args()?;

    // Logging goes to stderr; stdout carries the MCP stdio transport
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level)),
        )
        .init();

    tracing::info!(
        "Shell MCP Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let server = ShellMcpServer::with_config(config);

    tracing::info!("Server initialized, starting stdio transport...");

    // Serve the MCP server over stdio
    let service = server.serve(stdio()).await.map_err(|e| {
        tracing::error!("Error starting server: {}", e);
        e
    })?;

    tracing::info!("Shell MCP Server running on stdio");

    // Wait for the service to complete
    service.waiting().await?;

    tracing::info!("Shell MCP Server shutting down");

    Ok(())
}
