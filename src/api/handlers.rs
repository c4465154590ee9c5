//! HTTP request handlers

use super::types::{
    AssistantMessageResponse, CreateSessionRequest, ErrorResponse, HealthChecks, HealthResponse,
    MessageListResponse, MessageRequest, RootResponse, SessionListResponse, SessionResponse,
    SessionWithMessagesResponse, SuccessResponse, UsageResponse,
};
use super::AppState;
use crate::session::{new_id, AgentConfig, Session};
use crate::turn::{ConversationState, Message, TurnError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // Session CRUD
        .route("/sessions", post(create_session).get(list_sessions))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        // Turns
        .route(
            "/sessions/:id/messages",
            post(send_message).get(list_messages),
        )
        .with_state(state)
}

// ============================================================
// Service info
// ============================================================

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Switchboard agent API running",
    })
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        active_sessions: state.sessions.count().await,
        checks: HealthChecks {
            llm_provider: "ok",
            session_store: "ok",
        },
    })
}

// ============================================================
// Sessions
// ============================================================

async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let requested = body.and_then(|Json(req)| req.agent_config).unwrap_or_default();

    let temperature = requested.temperature.unwrap_or(state.defaults.temperature);
    if !(0.0..=2.0).contains(&temperature) {
        return Err(AppError::BadRequest(
            "temperature must be between 0 and 2".to_string(),
        ));
    }

    let agent_config = AgentConfig {
        model: requested
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| state.defaults.model.clone()),
        temperature,
    };

    let summary = state.sessions.create(agent_config).await;
    Ok((StatusCode::CREATED, Json(summary.into())))
}

async fn list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    Json(SessionListResponse {
        sessions: state.sessions.list().await,
    })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionWithMessagesResponse>, AppError> {
    let handle = find_session(&state, &id).await?;
    let session = handle.lock().await;

    Ok(Json(SessionWithMessagesResponse {
        session: session.summary(),
        messages: session.messages.clone(),
    }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    if state.sessions.remove(&id).await {
        Ok(Json(SuccessResponse { success: true }))
    } else {
        Err(session_not_found(&id))
    }
}

// ============================================================
// Turns
// ============================================================

async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageListResponse>, AppError> {
    let handle = find_session(&state, &id).await?;
    let session = handle.lock().await;

    Ok(Json(MessageListResponse {
        session_id: id,
        messages: session.messages.clone(),
    }))
}

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<AssistantMessageResponse>, AppError> {
    let user_text = req.content.trim();
    if user_text.is_empty() {
        return Err(AppError::BadRequest("content must not be empty".to_string()));
    }

    let handle = find_session(&state, &id).await?;
    let start = Instant::now();

    // Held for the whole turn: one turn at a time per session
    let mut session = handle.lock().await;

    let history = session.history();
    let prior_len = history.len();
    session.append(Message::user(user_text));

    let mut turn = ConversationState::for_turn(&id, history, user_text);
    if let Some(tag) = req.routing_tag() {
        turn = turn.with_routing_tag(tag);
    }
    let result = state.orchestrator.run(turn).await.map_err(|e| {
        tracing::error!(session_id = %id, error = %e, "Turn failed");
        AppError::from(e)
    })?;

    let content = result
        .last_assistant_text()
        .map_or_else(|| result.response.trim().to_string(), str::to_string);

    // Everything after the prior history and this turn's user message
    let mut message_id = None;
    for message in result.messages.into_iter().skip(prior_len + 1) {
        message_id = Some(session.append(message).message_id.clone());
    }
    drop(session);

    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    tracing::info!(
        session_id = %id,
        decision = result.next_node.map_or("none", |n| n.as_str()),
        latency_ms,
        "Turn completed"
    );

    Ok(Json(AssistantMessageResponse {
        message_id: message_id.unwrap_or_else(|| new_id("msg_", 10)),
        session_id: id,
        role: "assistant",
        content,
        tool_calls: result.tool_calls,
        usage: UsageResponse {
            prompt_tokens: result.usage.prompt_tokens,
            completion_tokens: result.usage.completion_tokens,
            total_tokens: result.usage.total_tokens(),
            llm_calls: result.usage.llm_calls,
        },
        latency_ms,
        created_at: Utc::now(),
    }))
}

async fn find_session(state: &AppState, id: &str) -> Result<Arc<Mutex<Session>>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| session_not_found(id))
}

fn session_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Session not found: {id}"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    NotFound(String),
    /// A provider the turn depends on failed
    BadGateway(String),
}

impl From<TurnError> for AppError {
    fn from(e: TurnError) -> Self {
        AppError::BadGateway(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
