//! Integration tests for the shell-mcp protocol layer.

use rmcp::ServerHandler;
use shell_mcp::{ExecuteCommandParams, ReadOutputParams, ShellMcpServer};
use shell_mcp_core::ServerConfig;

#[tokio::test]
async fn test_server_reports_tool_capability() {
    let server = ShellMcpServer::new();
    let info = server.get_info();

    assert!(info.capabilities.tools.is_some());
    let instructions = info.instructions.expect("instructions should be set");
    assert!(instructions.contains("execute_command"));
    assert!(instructions.contains("read_output"));
    assert!(instructions.contains("force_terminate"));
}

#[tokio::test]
async fn test_server_accepts_custom_config() {
    let mut config = ServerConfig::default();
    config.session.max_sessions = 3;
    let server = ShellMcpServer::with_config(config);

    // Construction starts the sweeper; the server must stay usable
    let info = server.get_info();
    assert!(info.capabilities.tools.is_some());
}

#[test]
fn test_tool_params_parse_from_wire_json() {
    let execute: ExecuteCommandParams = serde_json::from_str(
        r#"{"command": "cargo build 2>&1", "shell": "/bin/bash", "timeout_ms": 120000}"#,
    )
    .unwrap();
    assert_eq!(execute.command, "cargo build 2>&1");
    assert_eq!(execute.shell.as_deref(), Some("/bin/bash"));
    assert_eq!(execute.timeout_ms, 120_000);

    let read: ReadOutputParams = serde_json::from_str(
        r#"{"session": "1766400000000-a1b2c3d4", "search_pattern": "error", "is_regex": false, "case_sensitive": false, "target": "stderr"}"#,
    )
    .unwrap();
    assert_eq!(read.session, "1766400000000-a1b2c3d4");
    assert_eq!(read.search_pattern.as_deref(), Some("error"));
    assert!(!read.case_sensitive);
    assert_eq!(read.target, "stderr");
}
