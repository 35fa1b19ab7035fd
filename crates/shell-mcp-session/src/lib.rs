//! # shell-mcp-session
//!
//! Session lifecycle management for the Shell MCP Server.
//!
//! This crate provides:
//! - Command launching with a completion race (finished vs. backgrounded)
//! - Session state tracking and the process-wide registry
//! - Output reading and line search over accumulated buffers
//! - Graceful-then-forceful termination and idle sweeping
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on shell-mcp-core and
//! owns every OS process spawned on behalf of a caller.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod launcher;
pub mod manager;
pub mod registry;
pub mod search;
pub mod session;
pub mod termination;

// Re-export commonly used types
pub use manager::{
    ExecOutcome, ListOutcome, ReadContent, ReadOutcome, SearchRequest, SessionManager,
    TerminateOutcome,
};
pub use registry::{RegistryStatistics, SessionRegistry, SessionSummary, SharedSession};
pub use search::{SearchMatch, SearchTarget, StreamKind};
pub use session::SessionState;
