//! Session identity types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Unique identifier for a command session.
///
/// Generated at creation from the current epoch milliseconds plus a random
/// suffix; unique for the lifetime of the process and never reused. The OS
/// process id is deliberately not part of the identity, since the OS may
/// recycle pids after exit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", millis, &suffix[..8]))
    }

    /// View the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exit information reported by the OS when a process closes.
///
/// Both fields stay `None` while the process is active. On a normal exit
/// `code` is set; on a signal-caused death (unix) `signal` is set instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExitStatusInfo {
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
    /// Terminating signal number, if the process was killed by a signal
    pub signal: Option<i32>,
}
