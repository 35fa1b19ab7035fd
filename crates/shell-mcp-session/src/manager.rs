//! Session manager: the public face of the terminal session subsystem.
//!
//! Callers never see the registry itself; they operate through the four
//! defined operations (execute, read/search, list, terminate) and only ever
//! receive snapshots.

use std::path::PathBuf;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use shell_mcp_core::{ExitStatusInfo, Result, ServerConfig, SessionId};

use crate::launcher;
use crate::registry::{RegistryStatistics, SessionRegistry, SessionSummary};
use crate::search::{search_buffers, SearchMatch, SearchTarget};
use crate::termination;

/// Result of launching a command: the completion-race verdict plus the
/// buffers accumulated up to that moment.
#[derive(Debug, Clone)]
pub struct ExecOutcome {
    /// Identifier of the session that was created
    pub session_id: SessionId,
    /// OS process id of the spawned shell
    pub pid: u32,
    /// True when the process closed before the timeout elapsed
    pub completed: bool,
    /// Trimmed stdout snapshot
    pub stdout: String,
    /// Trimmed stderr snapshot
    pub stderr: String,
    /// Exit information; only populated when `completed` is true
    pub exit: ExitStatusInfo,
    /// Shell the command ran under
    pub shell: String,
    /// Resolved working directory
    pub working_directory: PathBuf,
}

/// Search parameters for `read_output` in search mode.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Pattern to evaluate against each line
    pub pattern: String,
    /// Interpret the pattern as a regular expression instead of literal text
    pub is_regex: bool,
    /// Case-sensitive matching
    pub case_sensitive: bool,
    /// Buffer(s) to search
    pub target: SearchTarget,
}

/// Result of a read or search over a session's buffers.
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    /// Identifier of the session that was read
    pub session_id: SessionId,
    /// OS process id
    pub pid: u32,
    /// Whether the process is still running
    pub is_active: bool,
    /// Exit information, populated once the process has closed
    pub exit: ExitStatusInfo,
    /// Full buffers or search matches
    pub content: ReadContent,
}

/// Payload of a read: either the full buffers or the filtered view.
#[derive(Debug, Clone)]
pub enum ReadContent {
    /// Plain mode: full current buffers
    Full {
        /// Accumulated stdout
        stdout: String,
        /// Accumulated stderr
        stderr: String,
    },
    /// Search mode: matched lines; the match count is `matches.len()`
    Matches(Vec<SearchMatch>),
}

/// Snapshot of the registry for listing.
#[derive(Debug, Clone)]
pub struct ListOutcome {
    /// Aggregate counts; active + completed == total
    pub statistics: RegistryStatistics,
    /// Per-session summaries, newest first
    pub sessions: Vec<SessionSummary>,
}

/// Result of a forced termination.
#[derive(Debug, Clone)]
pub struct TerminateOutcome {
    /// Identifier of the removed session
    pub session_id: SessionId,
    /// OS process id the signals were sent to
    pub pid: u32,
    /// Command the session was running
    pub command: String,
    /// Whether the session was still active when termination began
    pub was_active: bool,
    /// Human-readable process name, when the lookup succeeded
    pub process_name: Option<String>,
}

/// Coordinates session launching, reading, listing and termination over one
/// process-wide registry.
pub struct SessionManager {
    registry: SessionRegistry,
    config: ServerConfig,
}

impl SessionManager {
    /// Create a session manager with default configuration.
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a session manager with custom configuration.
    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            registry: SessionRegistry::new(),
            config,
        }
    }

    /// The configuration in effect.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Start the idle sweeper in the background.
    pub fn start_sweeper(&self) -> JoinHandle<()> {
        self.registry.spawn_sweeper(
            Duration::from_millis(self.config.session.sweep_interval_ms),
            Duration::from_millis(self.config.session.idle_threshold_ms),
        )
    }

    /// Launch a command and report whether it finished within the timeout.
    ///
    /// A command's own failure (non-zero exit, crash) is data in the
    /// outcome, never an error; only validation and launch failures reject
    /// the call.
    pub async fn execute(
        &self,
        command: String,
        shell: Option<String>,
        timeout_ms: u64,
    ) -> Result<ExecOutcome> {
        launcher::launch(&self.registry, &self.config, command, shell, timeout_ms).await
    }

    /// Read a session's buffers, optionally filtered by a search pattern.
    ///
    /// Mutates nothing except the activity timestamp; repeated identical
    /// calls against an unchanged session produce identical results.
    pub async fn read_output(
        &self,
        identifier: &str,
        search: Option<SearchRequest>,
    ) -> Result<ReadOutcome> {
        let shared = self.registry.resolve(identifier).await?;
        let mut state = shared.lock().await;

        let content = match search {
            Some(req) => {
                let matches = search_buffers(
                    &state.stdout,
                    &state.stderr,
                    &req.pattern,
                    req.is_regex,
                    req.case_sensitive,
                    req.target,
                    &self.config.limits,
                )?;
                ReadContent::Matches(matches)
            }
            None => ReadContent::Full {
                stdout: state.stdout.clone(),
                stderr: state.stderr.clone(),
            },
        };

        state.touch();
        Ok(ReadOutcome {
            session_id: state.id.clone(),
            pid: state.pid,
            is_active: state.is_active,
            exit: state.exit,
            content,
        })
    }

    /// Immutable snapshot of all sessions with aggregate counts.
    pub async fn list_sessions(&self) -> ListOutcome {
        let (statistics, sessions) = self.registry.snapshot().await;
        ListOutcome {
            statistics,
            sessions,
        }
    }

    /// Stop a session's process and remove the session from the registry.
    ///
    /// Graceful terminate first; after the grace window a forceful kill if
    /// the process is still alive. The registry entry is removed regardless
    /// of whether the final kill could be confirmed - the registry's job is
    /// bookkeeping, not guaranteed OS-level termination.
    pub async fn force_terminate(&self, identifier: &str) -> Result<TerminateOutcome> {
        let shared = self.registry.resolve(identifier).await?;

        let (id, pid, command, was_active) = {
            let state = shared.lock().await;
            (
                state.id.clone(),
                state.pid,
                state.command.clone(),
                state.is_active,
            )
        };

        let process_name = termination::process_name(pid);

        if was_active {
            termination::send_terminate(pid);
            tokio::time::sleep(Duration::from_millis(self.config.session.grace_window_ms)).await;
            if termination::is_alive(pid) {
                termination::send_kill(pid);
                if termination::is_alive(pid) {
                    warn!(
                        "Could not confirm termination, deregistering anyway: id={}, pid={}",
                        id, pid
                    );
                }
            }
        }

        self.registry.remove(&id).await;
        info!(
            "Session terminated: id={}, pid={}, command='{}', was_active={}, process={}",
            id,
            pid,
            command,
            was_active,
            process_name.as_deref().unwrap_or("unknown")
        );

        Ok(TerminateOutcome {
            session_id: id,
            pid,
            command,
            was_active,
            process_name,
        })
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shell_mcp_core::Error;

    #[tokio::test]
    async fn test_execute_and_read_back() {
        let manager = SessionManager::new();
        let outcome = manager
            .execute("echo hello".to_string(), None, 5000)
            .await
            .unwrap();
        assert!(outcome.completed);

        let read = manager
            .read_output(outcome.session_id.as_str(), None)
            .await
            .unwrap();
        assert!(!read.is_active);
        assert_eq!(read.exit.code, Some(0));
        match read.content {
            ReadContent::Full { stdout, .. } => assert_eq!(stdout.trim(), "hello"),
            ReadContent::Matches(_) => panic!("expected full read"),
        }
    }

    #[tokio::test]
    async fn test_read_unknown_session() {
        let manager = SessionManager::new();
        let err = manager.read_output("no-such-session", None).await.unwrap_err();
        assert!(matches!(err, Error::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_search_does_not_mutate_buffers() {
        let manager = SessionManager::new();
        let outcome = manager
            .execute("echo ERROR; echo fine".to_string(), None, 5000)
            .await
            .unwrap();

        let before = match manager
            .read_output(outcome.session_id.as_str(), None)
            .await
            .unwrap()
            .content
        {
            ReadContent::Full { stdout, .. } => stdout,
            _ => unreachable!(),
        };

        let search = manager
            .read_output(
                outcome.session_id.as_str(),
                Some(SearchRequest {
                    pattern: "ERROR".to_string(),
                    is_regex: false,
                    case_sensitive: true,
                    target: SearchTarget::Both,
                }),
            )
            .await
            .unwrap();
        match search.content {
            ReadContent::Matches(matches) => {
                assert_eq!(matches.len(), 1);
                assert_eq!(matches[0].line, "ERROR");
            }
            _ => panic!("expected matches"),
        }

        let after = match manager
            .read_output(outcome.session_id.as_str(), None)
            .await
            .unwrap()
            .content
        {
            ReadContent::Full { stdout, .. } => stdout,
            _ => unreachable!(),
        };
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_list_statistics_sum() {
        let manager = SessionManager::new();
        manager
            .execute("echo one".to_string(), None, 5000)
            .await
            .unwrap();
        manager
            .execute("echo two".to_string(), None, 5000)
            .await
            .unwrap();

        let listing = manager.list_sessions().await;
        assert_eq!(
            listing.statistics.active_sessions + listing.statistics.completed_sessions,
            listing.statistics.total_sessions
        );
        assert_eq!(listing.statistics.total_sessions, 2);
    }

    #[tokio::test]
    async fn test_terminate_unknown_session_is_an_error() {
        let manager = SessionManager::new();
        let err = manager.force_terminate("999999").await.unwrap_err();
        assert!(matches!(err, Error::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_terminate_completed_session_removes_it() {
        let manager = SessionManager::new();
        let outcome = manager
            .execute("echo done".to_string(), None, 5000)
            .await
            .unwrap();

        let terminated = manager
            .force_terminate(outcome.session_id.as_str())
            .await
            .unwrap();
        assert!(!terminated.was_active);
        assert_eq!(terminated.pid, outcome.pid);

        let err = manager
            .read_output(outcome.session_id.as_str(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SessionNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_terminate_running_session() {
        let mut config = ServerConfig::default();
        config.session.grace_window_ms = 100;
        let manager = SessionManager::with_config(config);

        let outcome = manager
            .execute("sleep 30".to_string(), None, 100)
            .await
            .unwrap();
        assert!(!outcome.completed);

        let terminated = manager
            .force_terminate(outcome.session_id.as_str())
            .await
            .unwrap();
        assert!(terminated.was_active);
        assert_eq!(terminated.command, "sleep 30");

        // Removal is final: a second terminate reports not-found
        let err = manager
            .force_terminate(outcome.session_id.as_str())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SessionNotFound(_)));
    }
}
