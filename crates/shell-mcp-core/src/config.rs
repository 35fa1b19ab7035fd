//! Configuration types for the Shell MCP Server.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Server configuration loaded from YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Server settings
    pub server: ServerSettings,
    /// Session lifecycle settings
    pub session: SessionSettings,
    /// Boundary limits
    pub limits: LimitSettings,
}

impl ServerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        let config: ServerConfig = serde_yaml::from_str(yaml)
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> crate::Result<()> {
        if self.session.max_sessions == 0 {
            return Err(crate::Error::Config(
                "session.max_sessions must be > 0".to_string(),
            ));
        }

        if self.limits.min_timeout_ms == 0 || self.limits.min_timeout_ms > self.limits.max_timeout_ms
        {
            return Err(crate::Error::Config(format!(
                "timeout bounds invalid: [{}, {}]",
                self.limits.min_timeout_ms, self.limits.max_timeout_ms
            )));
        }

        if self.limits.max_command_length == 0 {
            return Err(crate::Error::Config(
                "limits.max_command_length must be > 0".to_string(),
            ));
        }

        if self.limits.max_pattern_length == 0 {
            return Err(crate::Error::Config(
                "limits.max_pattern_length must be > 0".to_string(),
            ));
        }

        if self.session.sweep_interval_ms == 0 {
            return Err(crate::Error::Config(
                "session.sweep_interval_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Transport type (stdio, tcp, etc.)
    pub transport: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            transport: "stdio".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Session lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Maximum number of tracked sessions (active plus lingering)
    pub max_sessions: usize,
    /// Delay between SIGTERM and SIGKILL during termination, in milliseconds
    pub grace_window_ms: u64,
    /// How long a naturally completed session stays readable before
    /// automatic removal, in milliseconds
    pub completed_linger_ms: u64,
    /// Idle sweeper interval in milliseconds
    pub sweep_interval_ms: u64,
    /// Inactivity threshold after which a completed session is swept,
    /// in milliseconds
    pub idle_threshold_ms: u64,
    /// Shell executable to use; platform default when unset
    pub default_shell: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_sessions: 50,
            grace_window_ms: 1000,
            completed_linger_ms: 30_000,
            sweep_interval_ms: 60_000,
            idle_threshold_ms: 300_000,
            default_shell: None,
        }
    }
}

/// Boundary limits enforced before any process or registry mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    /// Maximum command length in characters
    pub max_command_length: usize,
    /// Minimum execution timeout in milliseconds
    pub min_timeout_ms: u64,
    /// Maximum execution timeout in milliseconds
    pub max_timeout_ms: u64,
    /// Maximum search pattern length in characters
    pub max_pattern_length: usize,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_command_length: 8192,
            min_timeout_ms: 100,
            max_timeout_ms: 300_000,
            max_pattern_length: 1000,
        }
    }
}
