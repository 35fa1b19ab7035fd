//! # shell-mcp-core
//!
//! Core types for the Shell MCP Server.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other shell-mcp crates. It provides:
//!
//! - Session identity types (SessionId, ExitStatusInfo)
//! - Error types
//! - Configuration loading and validation
//! - Boundary validation (command, timeout, search pattern)
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other shell-mcp crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export all modules
pub mod config;
pub mod error;
pub mod session;
pub mod validate;

// Re-export commonly used types
pub use config::{LimitSettings, ServerConfig, ServerSettings, SessionSettings};
pub use error::{Error, Result};
pub use session::{ExitStatusInfo, SessionId};
pub use validate::{validate_command, validate_pattern, validate_timeout};
