//! Process-wide session registry and the idle sweeper.
//!
//! The registry is the single source of truth for "what is running / has
//! run". Membership is the only indicator that a session can still be
//! operated on; removal is final. All mutation happens behind one mutex, so
//! callbacks from different sessions never interleave mid-mutation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use shell_mcp_core::{Error, Result, SessionId};

use crate::session::SessionState;

/// Shared handle to one session's state.
pub type SharedSession = Arc<Mutex<SessionState>>;

/// In-memory keyed store of session records.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<SessionId, SharedSession>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new session record, enforcing the tracked-session cap.
    pub async fn insert(&self, state: SessionState, max_sessions: usize) -> Result<SharedSession> {
        let mut sessions = self.sessions.lock().await;
        if sessions.len() >= max_sessions {
            return Err(Error::SessionLimitReached(max_sessions));
        }
        let id = state.id.clone();
        let shared = Arc::new(Mutex::new(state));
        sessions.insert(id, Arc::clone(&shared));
        Ok(shared)
    }

    /// Get a session by exact id.
    pub async fn get(&self, id: &SessionId) -> Option<SharedSession> {
        self.sessions.lock().await.get(id).cloned()
    }

    /// Resolve a caller-supplied identifier to a session.
    ///
    /// An identifier matches on the exact session id, or — when it is purely
    /// numeric — on the exact OS process id. When an exited session's pid was
    /// recycled, the newest matching session wins. Substring matching against
    /// generated ids is deliberately not supported.
    pub async fn resolve(&self, identifier: &str) -> Result<SharedSession> {
        let sessions = self.sessions.lock().await;

        let exact = SessionId::from(identifier);
        if let Some(shared) = sessions.get(&exact) {
            return Ok(Arc::clone(shared));
        }

        if let Ok(pid) = identifier.parse::<u32>() {
            let mut best: Option<(chrono::DateTime<Utc>, SharedSession)> = None;
            for shared in sessions.values() {
                let state = shared.lock().await;
                if state.pid == pid {
                    match &best {
                        Some((created, _)) if *created >= state.created_at => {}
                        _ => best = Some((state.created_at, Arc::clone(shared))),
                    }
                }
            }
            if let Some((_, shared)) = best {
                return Ok(shared);
            }
        }

        Err(Error::SessionNotFound(identifier.to_string()))
    }

    /// Remove a session. Removal is final and irreversible.
    pub async fn remove(&self, id: &SessionId) -> Option<SharedSession> {
        let removed = self.sessions.lock().await.remove(id);
        if removed.is_some() {
            debug!("Session removed from registry: id={}", id);
        }
        removed
    }

    /// Number of tracked sessions.
    pub async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Immutable snapshot of all sessions with derived fields, sorted
    /// newest-first, plus aggregate counts.
    pub async fn snapshot(&self) -> (RegistryStatistics, Vec<SessionSummary>) {
        let sessions = self.sessions.lock().await;
        let now = Utc::now();

        let mut summaries = Vec::with_capacity(sessions.len());
        for shared in sessions.values() {
            let state = shared.lock().await;
            summaries.push(SessionSummary {
                session_id: state.id.clone(),
                pid: state.pid,
                command: state.command.clone(),
                is_active: state.is_active,
                runtime_ms: state.runtime_ms(now),
                idle_ms: state.idle_ms(now),
                exit_code: state.exit.code,
                exit_signal: state.exit.signal,
                created_at: state.created_at.to_rfc3339(),
            });
        }

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = summaries.len();
        let active = summaries.iter().filter(|s| s.is_active).count();
        let statistics = RegistryStatistics {
            total_sessions: total,
            active_sessions: active,
            completed_sessions: total - active,
        };

        (statistics, summaries)
    }

    /// Schedule removal of a session after a delay. Used for the short
    /// linger after natural completion, so a caller gets one final read.
    /// The task skips sessions that are still active at fire time.
    pub fn schedule_removal(&self, id: SessionId, delay: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let still_active = match registry.get(&id).await {
                Some(shared) => shared.lock().await.is_active,
                None => return,
            };
            if !still_active {
                registry.remove(&id).await;
                info!("Completed session reclaimed after linger: id={}", id);
            }
        })
    }

    /// Start the idle sweeper: a background timer that reclaims sessions
    /// which finished long ago and have had no further activity. Active
    /// sessions are never swept, however long-lived.
    pub fn spawn_sweeper(&self, interval: Duration, idle_threshold: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it
            ticker.tick().await;
            loop {
                ticker.tick().await;
                registry.sweep_idle(idle_threshold).await;
            }
        })
    }

    /// One sweep pass: remove every inactive session whose idle time exceeds
    /// the threshold.
    pub async fn sweep_idle(&self, idle_threshold: Duration) {
        let now = Utc::now();
        let threshold_ms = idle_threshold.as_millis() as i64;

        let candidates: Vec<SessionId> = {
            let sessions = self.sessions.lock().await;
            let mut ids = Vec::new();
            for (id, shared) in sessions.iter() {
                let state = shared.lock().await;
                if !state.is_active && state.idle_ms(now) > threshold_ms {
                    ids.push(id.clone());
                }
            }
            ids
        };

        for id in candidates {
            if self.remove(&id).await.is_some() {
                info!("Idle session swept: id={}", id);
            }
        }
    }
}

/// Aggregate counts over the registry. `active + completed == total` always.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RegistryStatistics {
    /// All tracked sessions
    pub total_sessions: usize,
    /// Sessions whose process is still running
    pub active_sessions: usize,
    /// Sessions whose process has closed or errored
    pub completed_sessions: usize,
}

/// Derived, immutable view of one session for listing.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionSummary {
    /// Session identifier
    pub session_id: SessionId,
    /// OS process id
    pub pid: u32,
    /// Command being run
    pub command: String,
    /// Whether the process is still running
    pub is_active: bool,
    /// Elapsed duration in milliseconds
    pub runtime_ms: i64,
    /// Time since last activity in milliseconds
    pub idle_ms: i64,
    /// Exit code, if closed normally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Terminating signal, if killed by a signal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_signal: Option<i32>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}
