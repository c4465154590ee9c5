//! HTTP API for the agent server

mod handlers;
mod types;

pub use handlers::create_router;

use crate::session::{AgentConfig, SessionStore};
use crate::turn::TurnOrchestrator;
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub orchestrator: Arc<TurnOrchestrator>,
    /// Agent settings for sessions created without an explicit config
    pub defaults: AgentConfig,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(orchestrator: Arc<TurnOrchestrator>, defaults: AgentConfig) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new()),
            orchestrator,
            defaults,
            started_at: Instant::now(),
        }
    }
}
