//! Session state: one OS process bound to its accumulated output.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::info;

use shell_mcp_core::{ExitStatusInfo, SessionId};

/// State of a single command session.
///
/// Exactly one OS process is associated with a session for its entire life.
/// The stdout/stderr buffers are append-only; nothing truncates or rewrites
/// them short of full session deletion.
#[derive(Debug)]
pub struct SessionState {
    /// Session identifier, unique for the process lifetime
    pub id: SessionId,

    /// OS process id of the spawned shell (may be recycled by the OS after
    /// exit; never used as a stable key on its own)
    pub pid: u32,

    /// The exact command string that was launched
    pub command: String,

    /// Shell the command ran under
    pub shell: String,

    /// Resolved directory the command ran in
    pub working_directory: PathBuf,

    /// Accumulated stdout, decoded as text
    pub stdout: String,

    /// Accumulated stderr, decoded as text
    pub stderr: String,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Advances on every output event and on explicit reads
    pub last_activity: DateTime<Utc>,

    /// True from creation until the process closes or errors
    pub is_active: bool,

    /// Exit code/signal, set exactly once when the process closes
    pub exit: ExitStatusInfo,
}

impl SessionState {
    /// Create a new active session record.
    pub fn new(
        id: SessionId,
        pid: u32,
        command: String,
        shell: String,
        working_directory: PathBuf,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            pid,
            command,
            shell,
            working_directory,
            stdout: String::new(),
            stderr: String::new(),
            created_at: now,
            last_activity: now,
            is_active: true,
            exit: ExitStatusInfo::default(),
        }
    }

    /// Append decoded stdout text and refresh the activity timestamp.
    pub fn append_stdout(&mut self, text: &str) {
        self.stdout.push_str(text);
        self.last_activity = Utc::now();
    }

    /// Append decoded stderr text and refresh the activity timestamp.
    pub fn append_stderr(&mut self, text: &str) {
        self.stderr.push_str(text);
        self.last_activity = Utc::now();
    }

    /// Refresh the activity timestamp on an explicit read.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Record the close event: exit information is set exactly once and the
    /// session leaves the active state.
    pub fn mark_closed(&mut self, exit: ExitStatusInfo) {
        if !self.is_active {
            return;
        }
        self.exit = exit;
        self.is_active = false;
        self.last_activity = Utc::now();
        info!(
            "Session closed: id={}, pid={}, exit_code={:?}, exit_signal={:?}",
            self.id, self.pid, exit.code, exit.signal
        );
    }

    /// Record a process-level error. The message is annotated into the error
    /// buffer and the session leaves the active state; this is data, never a
    /// call-level failure.
    pub fn mark_failed(&mut self, message: &str) {
        if !self.is_active {
            return;
        }
        self.stderr.push_str(&format!("\n[process error: {message}]\n"));
        self.is_active = false;
        self.last_activity = Utc::now();
        info!("Session failed: id={}, pid={}, error={}", self.id, self.pid, message);
    }

    /// Elapsed time since creation, in milliseconds. For closed sessions this
    /// measures up to the last activity (the close event) instead of now.
    pub fn runtime_ms(&self, now: DateTime<Utc>) -> i64 {
        let end = if self.is_active { now } else { self.last_activity };
        (end - self.created_at).num_milliseconds().max(0)
    }

    /// Time since the last activity, in milliseconds.
    pub fn idle_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_activity).num_milliseconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SessionState {
        SessionState::new(
            SessionId::new(),
            4242,
            "echo hello".to_string(),
            "/bin/sh".to_string(),
            PathBuf::from("/tmp"),
        )
    }

    #[test]
    fn test_new_session_is_active() {
        let s = state();
        assert!(s.is_active);
        assert_eq!(s.exit.code, None);
        assert_eq!(s.exit.signal, None);
        assert!(s.stdout.is_empty());
        assert!(s.stderr.is_empty());
    }

    #[test]
    fn test_buffers_only_grow() {
        let mut s = state();
        s.append_stdout("line one\n");
        s.append_stdout("line two\n");
        s.append_stderr("oops\n");

        assert_eq!(s.stdout, "line one\nline two\n");
        assert_eq!(s.stderr, "oops\n");
    }

    #[test]
    fn test_append_bumps_activity() {
        let mut s = state();
        let before = s.last_activity;
        std::thread::sleep(std::time::Duration::from_millis(5));
        s.append_stdout("x");
        assert!(s.last_activity > before);
    }

    #[test]
    fn test_mark_closed_sets_exit_once() {
        let mut s = state();
        s.mark_closed(ExitStatusInfo {
            code: Some(0),
            signal: None,
        });
        assert!(!s.is_active);
        assert_eq!(s.exit.code, Some(0));

        // A second close event must not rewrite the exit fields
        s.mark_closed(ExitStatusInfo {
            code: Some(1),
            signal: None,
        });
        assert_eq!(s.exit.code, Some(0));
    }

    #[test]
    fn test_mark_failed_annotates_stderr() {
        let mut s = state();
        s.mark_failed("wait failed: no child");
        assert!(!s.is_active);
        assert!(s.stderr.contains("[process error: wait failed: no child]"));
        assert_eq!(s.exit.code, None);
    }

    #[test]
    fn test_mark_failed_after_close_is_noop() {
        let mut s = state();
        s.mark_closed(ExitStatusInfo {
            code: Some(0),
            signal: None,
        });
        s.mark_failed("late error");
        assert!(s.stderr.is_empty());
    }

    #[test]
    fn test_runtime_and_idle() {
        let mut s = state();
        let now = Utc::now() + chrono::Duration::milliseconds(100);
        assert!(s.runtime_ms(now) >= 100);
        assert!(s.idle_ms(now) >= 100);

        s.mark_closed(ExitStatusInfo {
            code: Some(0),
            signal: None,
        });
        let later = Utc::now() + chrono::Duration::milliseconds(500);
        // Runtime freezes at close; idle keeps growing
        assert!(s.runtime_ms(later) < 500);
        assert!(s.idle_ms(later) >= 500);
    }
}
