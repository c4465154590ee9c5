//! API request and response types

use crate::session::{AgentConfig, SessionStatus, SessionSummary, StoredMessage};
use crate::turn::ToolCallRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request to create a session
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub agent_config: Option<AgentConfigRequest>,
}

/// Partial agent settings; omitted fields take the server defaults
#[derive(Debug, Default, Deserialize)]
pub struct AgentConfigRequest {
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

/// Request to send a user message
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
    /// Free-form client data. A string `route` entry presets the routing decision.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl MessageRequest {
    pub fn routing_tag(&self) -> Option<&str> {
        self.metadata.get("route").and_then(Value::as_str)
    }
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub active_sessions: usize,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub llm_provider: &'static str,
    pub session_store: &'static str,
}

/// Response for session creation
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub agent_config: AgentConfig,
}

impl From<SessionSummary> for SessionResponse {
    fn from(summary: SessionSummary) -> Self {
        Self {
            session_id: summary.session_id,
            created_at: summary.created_at,
            status: summary.status,
            agent_config: summary.agent_config,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

/// Session with its full history
#[derive(Debug, Serialize)]
pub struct SessionWithMessagesResponse {
    #[serde(flatten)]
    pub session: SessionSummary,
    pub messages: Vec<StoredMessage>,
}

#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub session_id: String,
    pub messages: Vec<StoredMessage>,
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub llm_calls: u32,
}

/// The assistant's reply to one user message
#[derive(Debug, Serialize)]
pub struct AssistantMessageResponse {
    pub message_id: String,
    pub session_id: String,
    pub role: &'static str,
    pub content: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub usage: UsageResponse,
    pub latency_ms: u64,
    pub created_at: DateTime<Utc>,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
