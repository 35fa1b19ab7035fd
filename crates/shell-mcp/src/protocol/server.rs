//! Shell MCP Server Implementation
//!
//! This module implements the MCP server using rmcp 0.9's #[tool_router]
//! pattern. It routes MCP tool calls to the session manager.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData as McpError,
};

use tracing::{debug, error, info, instrument};

use shell_mcp_core::{Error, ServerConfig};
use shell_mcp_session::{ReadContent, SearchRequest, SearchTarget, SessionManager};

use crate::tools::*;

/// Translate a session-layer error into an MCP error: validation and
/// lookup failures are invalid-params, everything else is internal.
fn to_mcp_error(e: Error) -> McpError {
    let code = if e.is_validation() || matches!(e, Error::SessionNotFound(_)) {
        ErrorCode(-32602)
    } else {
        ErrorCode(-32603)
    };
    McpError::new(code, e.to_string(), None)
}

fn json_response<T: serde::Serialize>(response: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(response).map_err(|e| {
        error!("Failed to serialize response: {}", e);
        McpError::new(
            ErrorCode(-32603),
            format!("Failed to serialize response: {e}"),
            None,
        )
    })?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Shell MCP Server
///
/// Exposes the session manager's four operations as MCP tools.
#[derive(Clone)]
pub struct ShellMcpServer {
    /// Shared session manager (one registry per server process)
    manager: Arc<SessionManager>,
    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ShellMcpServer {
    /// Create a server with default configuration.
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a server with custom configuration and start the idle sweeper.
    pub fn with_config(config: ServerConfig) -> Self {
        let manager = Arc::new(SessionManager::with_config(config));
        manager.start_sweeper();
        Self {
            manager,
            tool_router: Self::tool_router(),
        }
    }

    /// Execute a shell command, waiting up to the timeout for completion
    #[tool(
        description = "Execute a shell command. Waits up to timeout_ms for completion; a command that runs longer continues in the background and its output can be fetched later with read_output."
    )]
    #[instrument(skip_all)]
    async fn execute_command(
        &self,
        Parameters(params): Parameters<ExecuteCommandParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            "Executing command: '{}', shell={:?}, timeout_ms={}",
            params.command, params.shell, params.timeout_ms
        );

        let outcome = self
            .manager
            .execute(params.command, params.shell, params.timeout_ms)
            .await
            .map_err(|e| {
                error!("Execute failed: {}", e);
                to_mcp_error(e)
            })?;

        let response = ExecuteCommandResponse {
            session_id: outcome.session_id.to_string(),
            pid: outcome.pid,
            completed: outcome.completed,
            output: outcome.stdout,
            error: outcome.stderr,
            exit_code: outcome.exit.code,
            exit_signal: outcome.exit.signal,
            shell: outcome.shell,
            working_directory: outcome.working_directory.display().to_string(),
            timestamp: now_rfc3339(),
        };

        json_response(&response)
    }

    /// Read or search a session's accumulated output
    #[tool(
        description = "Read the accumulated stdout/stderr of a session by session id or pid. Optionally filter with search_pattern (literal or regex) against stdout, stderr or both."
    )]
    #[instrument(skip_all)]
    async fn read_output(
        &self,
        Parameters(params): Parameters<ReadOutputParams>,
    ) -> Result<CallToolResult, McpError> {
        debug!(
            "Reading output: session={}, pattern={:?}",
            params.session, params.search_pattern
        );

        let search = match params.search_pattern {
            Some(pattern) => Some(SearchRequest {
                pattern,
                is_regex: params.is_regex,
                case_sensitive: params.case_sensitive,
                target: SearchTarget::parse(&params.target).map_err(to_mcp_error)?,
            }),
            None => None,
        };

        let outcome = self
            .manager
            .read_output(&params.session, search)
            .await
            .map_err(|e| {
                error!("Read failed: {}", e);
                to_mcp_error(e)
            })?;

        let (output, error, search_results) = match outcome.content {
            ReadContent::Full { stdout, stderr } => (Some(stdout), Some(stderr), None),
            ReadContent::Matches(matches) => {
                let match_count = matches.len();
                (
                    None,
                    None,
                    Some(SearchResults {
                        matches,
                        match_count,
                    }),
                )
            }
        };

        let response = ReadOutputResponse {
            session_id: outcome.session_id.to_string(),
            pid: outcome.pid,
            is_active: outcome.is_active,
            output,
            error,
            search_results,
            exit_code: outcome.exit.code,
            exit_signal: outcome.exit.signal,
            timestamp: now_rfc3339(),
        };

        json_response(&response)
    }

    /// List all tracked sessions with aggregate statistics
    #[tool(
        description = "List all tracked shell sessions with statistics (total, active, completed) and per-session runtime and idle times."
    )]
    #[instrument(skip_all)]
    async fn list_sessions(
        &self,
        Parameters(_params): Parameters<ListSessionsParams>,
    ) -> Result<CallToolResult, McpError> {
        debug!("Listing sessions");

        let listing = self.manager.list_sessions().await;
        info!(
            "Found {} session(s), {} active",
            listing.statistics.total_sessions, listing.statistics.active_sessions
        );

        let response = ListSessionsResponse {
            timestamp: now_rfc3339(),
            statistics: SessionStatistics {
                total_sessions: listing.statistics.total_sessions,
                active_sessions: listing.statistics.active_sessions,
                completed_sessions: listing.statistics.completed_sessions,
            },
            sessions: listing
                .sessions
                .into_iter()
                .map(|s| SessionEntry {
                    session_id: s.session_id.to_string(),
                    pid: s.pid,
                    command: s.command,
                    is_active: s.is_active,
                    runtime_ms: s.runtime_ms,
                    idle_ms: s.idle_ms,
                    exit_code: s.exit_code,
                })
                .collect(),
        };

        json_response(&response)
    }

    /// Terminate a session's process and remove the session
    #[tool(
        description = "Terminate a session by session id or pid: graceful signal first, forced kill after a grace window, then the session is removed."
    )]
    #[instrument(skip_all)]
    async fn force_terminate(
        &self,
        Parameters(params): Parameters<ForceTerminateParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("Terminating session: {}", params.session);

        let outcome = self
            .manager
            .force_terminate(&params.session)
            .await
            .map_err(|e| {
                error!("Terminate failed: {}", e);
                to_mcp_error(e)
            })?;

        let response = ForceTerminateResponse {
            session_id: outcome.session_id.to_string(),
            pid: outcome.pid,
            command: outcome.command,
            was_active: outcome.was_active,
            process_name: outcome.process_name,
            terminated_at: now_rfc3339(),
        };

        json_response(&response)
    }
}

impl Default for ShellMcpServer {
    fn default() -> Self {
        Self::new()
    }
}

// Implement the ServerHandler trait to define server capabilities
#[tool_handler]
impl rmcp::ServerHandler for ShellMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Shell MCP Server - Run shell commands with background session tracking. \
                 Use execute_command to run a command (it returns immediately with partial \
                 output if the timeout elapses), read_output to fetch or search a session's \
                 output later, list_sessions to see what is running, and force_terminate \
                 to stop a session."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
