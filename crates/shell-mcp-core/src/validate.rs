//! Boundary validation for commands, timeouts and search patterns.
//!
//! Everything here runs before any process is spawned or any registry entry
//! is created. A rejection from this module is always a descriptive failure
//! surfaced to the caller.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::LimitSettings;
use crate::{Error, Result};

lazy_static! {
    /// Deny-list of catastrophic operations. A match fails fast before any
    /// process is spawned.
    static ref DENY_PATTERNS: Vec<(Regex, &'static str)> = vec![
        (
            Regex::new(r"(?i)\brm\s+(-[a-z]*r[a-z]*f|-[a-z]*f[a-z]*r)[a-z]*\s+(/|/\*)(\s|$)")
                .unwrap(),
            "recursive root deletion",
        ),
        (
            Regex::new(r"(?i)\bmkfs(\.[a-z0-9]+)?\b").unwrap(),
            "disk formatting",
        ),
        (
            Regex::new(r"(?i)\bdd\b.*\bof=/dev/(sd|hd|nvme|disk)").unwrap(),
            "raw disk write",
        ),
        (
            Regex::new(r":\(\)\s*\{\s*:\|:&\s*\}\s*;?\s*:").unwrap(),
            "fork bomb",
        ),
        (
            Regex::new(r"(?i)\b(shutdown|reboot|halt|poweroff)\b").unwrap(),
            "system shutdown/reboot",
        ),
    ];
}

/// Validate a command string against length bounds and the deny-list.
pub fn validate_command(command: &str, limits: &LimitSettings) -> Result<()> {
    if command.trim().is_empty() {
        return Err(Error::InvalidCommand("command is empty".to_string()));
    }

    if command.len() > limits.max_command_length {
        return Err(Error::InvalidCommand(format!(
            "command length {} exceeds maximum of {} characters",
            command.len(),
            limits.max_command_length
        )));
    }

    for (pattern, label) in DENY_PATTERNS.iter() {
        if pattern.is_match(command) {
            return Err(Error::CommandNotAllowed(format!(
                "command matches deny-list entry: {label}"
            )));
        }
    }

    Ok(())
}

/// Validate an execution timeout against the configured bounds.
pub fn validate_timeout(timeout_ms: u64, limits: &LimitSettings) -> Result<()> {
    if timeout_ms < limits.min_timeout_ms || timeout_ms > limits.max_timeout_ms {
        return Err(Error::InvalidTimeout {
            requested_ms: timeout_ms,
            min_ms: limits.min_timeout_ms,
            max_ms: limits.max_timeout_ms,
        });
    }
    Ok(())
}

/// Validate a search pattern. In regex mode the pattern must also compile;
/// a non-compiling pattern is a rejection, not a silent empty result.
pub fn validate_pattern(pattern: &str, is_regex: bool, limits: &LimitSettings) -> Result<()> {
    if pattern.is_empty() {
        return Err(Error::InvalidPattern("pattern is empty".to_string()));
    }

    if pattern.len() > limits.max_pattern_length {
        return Err(Error::InvalidPattern(format!(
            "pattern length {} exceeds maximum of {} characters",
            pattern.len(),
            limits.max_pattern_length
        )));
    }

    if is_regex {
        Regex::new(pattern).map_err(|e| Error::PatternSyntax(e.to_string()))?;
    }

    Ok(())
}
