//! In-memory session store
//!
//! Each session sits behind its own async mutex. Holding it for the length of
//! a turn keeps appends ordered per session while other sessions run freely.
//! Nothing survives a process restart.

use crate::turn::{Message, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Per-session model settings, recorded at creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
}

/// A persisted conversation entry
#[derive(Debug, Clone, Serialize)]
pub struct StoredMessage {
    pub message_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub agent_config: AgentConfig,
    pub messages: Vec<StoredMessage>,
}

/// Session metadata without the message history
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub agent_config: AgentConfig,
    pub message_count: usize,
}

impl Session {
    fn new(agent_config: AgentConfig) -> Self {
        Self {
            id: new_id("sess_", 12),
            created_at: Utc::now(),
            status: SessionStatus::Active,
            agent_config,
            messages: Vec::new(),
        }
    }

    /// History in the shape the turn pipeline consumes
    pub fn history(&self) -> Vec<Message> {
        self.messages
            .iter()
            .map(|m| Message {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }

    pub fn append(&mut self, message: Message) -> &StoredMessage {
        self.messages.push(StoredMessage {
            message_id: new_id("msg_", 10),
            role: message.role,
            content: message.content,
            created_at: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            created_at: self.created_at,
            status: self.status,
            agent_config: self.agent_config.clone(),
            message_count: self.messages.len(),
        }
    }
}

/// `prefix` followed by `len` lowercase hex characters
pub fn new_id(prefix: &str, len: usize) -> String {
    let hex: String = uuid::Uuid::new_v4().simple().to_string().chars().take(len).collect();
    format!("{prefix}{hex}")
}

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, agent_config: AgentConfig) -> SessionSummary {
        let session = Session::new(agent_config);
        let summary = session.summary();
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), Arc::new(Mutex::new(session)));
        tracing::info!(session_id = %summary.session_id, "Session created");
        summary
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Summaries ordered by creation time
    pub async fn list(&self) -> Vec<SessionSummary> {
        let handles: Vec<_> = self.sessions.read().await.values().cloned().collect();
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            summaries.push(handle.lock().await.summary());
        }
        summaries.sort_by_key(|s| s.created_at);
        summaries
    }

    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Session deleted");
        }
        removed
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
