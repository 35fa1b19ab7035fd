//! MCP Tool Types
//!
//! This module defines all MCP tool parameter and response types exposed
//! by the shell server.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shell_mcp_session::SearchMatch;

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_case_sensitive() -> bool {
    true
}

fn default_target() -> String {
    "both".to_string()
}

// =============================================================================
// execute_command
// =============================================================================

/// Parameters for execute_command
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteCommandParams {
    /// Shell command line to execute (e.g., "cargo build 2>&1")
    pub command: String,

    /// Shell to run the command under (e.g., "/bin/bash"); defaults to the
    /// configured or platform shell
    #[serde(default)]
    pub shell: Option<String>,

    /// How long to wait for completion before the command continues in the
    /// background, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Response for execute_command
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteCommandResponse {
    /// Unique session identifier
    pub session_id: String,

    /// OS process id of the spawned shell
    pub pid: u32,

    /// Whether the command finished within the timeout
    pub completed: bool,

    /// Stdout captured so far
    pub output: String,

    /// Stderr captured so far
    pub error: String,

    /// Exit code (only when completed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    /// Terminating signal (only when killed by a signal)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_signal: Option<i32>,

    /// Shell the command ran under
    pub shell: String,

    /// Working directory the command ran in
    pub working_directory: String,

    /// Response timestamp (RFC 3339)
    pub timestamp: String,
}

// =============================================================================
// read_output
// =============================================================================

/// Parameters for read_output
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReadOutputParams {
    /// Session identifier or process id of the session to read
    pub session: String,

    /// When set, return only the lines matching this pattern instead of the
    /// full buffers
    #[serde(default)]
    pub search_pattern: Option<String>,

    /// Interpret the pattern as a regular expression instead of literal text
    #[serde(default)]
    pub is_regex: bool,

    /// Case-sensitive matching
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,

    /// Buffer(s) to search: "stdout", "stderr" or "both"
    #[serde(default = "default_target")]
    pub target: String,
}

/// Matched lines for a search-mode read
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchResults {
    /// Matching lines with stream and line number
    pub matches: Vec<SearchMatch>,

    /// Number of matching lines
    pub match_count: usize,
}

/// Response for read_output
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReadOutputResponse {
    /// Session that was read
    pub session_id: String,

    /// OS process id
    pub pid: u32,

    /// Whether the process is still running
    pub is_active: bool,

    /// Stdout buffer (plain mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Stderr buffer (plain mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Matched lines (search mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_results: Option<SearchResults>,

    /// Exit code, once the process has closed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    /// Terminating signal, if the process was killed by one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_signal: Option<i32>,

    /// Response timestamp (RFC 3339)
    pub timestamp: String,
}

// =============================================================================
// list_sessions
// =============================================================================

/// Parameters for list_sessions
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListSessionsParams {}

/// Aggregate session counts
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionStatistics {
    /// All tracked sessions
    pub total_sessions: usize,

    /// Sessions whose process is still running
    pub active_sessions: usize,

    /// Sessions whose process has closed but are still readable
    pub completed_sessions: usize,
}

/// One session in the listing
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionEntry {
    /// Session identifier
    pub session_id: String,

    /// OS process id
    pub pid: u32,

    /// Command the session is running
    pub command: String,

    /// Whether the process is still running
    pub is_active: bool,

    /// Time from creation to last activity, in milliseconds
    pub runtime_ms: i64,

    /// Time since last activity, in milliseconds
    pub idle_ms: i64,

    /// Exit code, once the process has closed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

/// Response for list_sessions
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListSessionsResponse {
    /// Response timestamp (RFC 3339)
    pub timestamp: String,

    /// Aggregate counts; active + completed == total
    pub statistics: SessionStatistics,

    /// Per-session summaries, newest first
    pub sessions: Vec<SessionEntry>,
}

// =============================================================================
// force_terminate
// =============================================================================

/// Parameters for force_terminate
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ForceTerminateParams {
    /// Session identifier or process id of the session to terminate
    pub session: String,
}

/// Response for force_terminate
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ForceTerminateResponse {
    /// Session that was removed
    pub session_id: String,

    /// OS process id the signals were sent to
    pub pid: u32,

    /// Command the session was running
    pub command: String,

    /// Whether the process was still running when termination began
    pub was_active: bool,

    /// Human-readable process name, when the lookup succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_name: Option<String>,

    /// Termination timestamp (RFC 3339)
    pub terminated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_params_defaults() {
        let params: ExecuteCommandParams =
            serde_json::from_str(r#"{"command": "echo hi"}"#).unwrap();
        assert_eq!(params.command, "echo hi");
        assert_eq!(params.shell, None);
        assert_eq!(params.timeout_ms, 30_000);
    }

    #[test]
    fn test_read_params_defaults() {
        let params: ReadOutputParams = serde_json::from_str(r#"{"session": "abc"}"#).unwrap();
        assert_eq!(params.session, "abc");
        assert_eq!(params.search_pattern, None);
        assert!(!params.is_regex);
        assert!(params.case_sensitive);
        assert_eq!(params.target, "both");
    }

    #[test]
    fn test_read_response_omits_unused_mode() {
        let response = ReadOutputResponse {
            session_id: "s".to_string(),
            pid: 42,
            is_active: true,
            output: Some("out".to_string()),
            error: Some("".to_string()),
            search_results: None,
            exit_code: None,
            exit_signal: None,
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"output\""));
        assert!(!json.contains("search_results"));
        assert!(!json.contains("exit_code"));
    }

    #[test]
    fn test_terminate_response_serializes_process_name_when_present() {
        let response = ForceTerminateResponse {
            session_id: "s".to_string(),
            pid: 42,
            command: "sleep 60".to_string(),
            was_active: true,
            process_name: Some("sleep".to_string()),
            terminated_at: "2026-01-01T00:00:00Z".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"process_name\":\"sleep\""));
    }
}
