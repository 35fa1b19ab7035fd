//! Error types for the Shell MCP Server.

use thiserror::Error;

/// Main error type for Shell MCP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Command rejected before launch (empty or over-length)
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Command matched the deny-list of catastrophic operations
    #[error("Command not allowed: {0}")]
    CommandNotAllowed(String),

    /// Timeout outside the accepted bounds
    #[error("Invalid timeout: {requested_ms}ms (must be between {min_ms}ms and {max_ms}ms)")]
    InvalidTimeout {
        /// Timeout the caller asked for
        requested_ms: u64,
        /// Lower bound
        min_ms: u64,
        /// Upper bound
        max_ms: u64,
    },

    /// Search pattern rejected (empty or over-length)
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),

    /// Search pattern failed to compile as a regular expression
    #[error("Invalid regex pattern: {0}")]
    PatternSyntax(String),

    /// No session matched the given identifier
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Shell executable could not be found at spawn time
    #[error("Shell not found: {0}")]
    ShellNotFound(String),

    /// Permission denied spawning the shell
    #[error("Permission denied spawning shell: {0}")]
    SpawnPermissionDenied(String),

    /// Process spawn failed for another reason; no session was created
    #[error("Failed to spawn process: {0}")]
    SpawnFailed(String),

    /// Session limit reached
    #[error("Session limit reached (max: {0})")]
    SessionLimitReached(usize),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error belongs to the validation class (rejected at the
    /// boundary, before any process or registry mutation).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidCommand(_)
                | Error::CommandNotAllowed(_)
                | Error::InvalidTimeout { .. }
                | Error::InvalidPattern(_)
                | Error::PatternSyntax(_)
                | Error::SessionLimitReached(_)
        )
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
