//! Switchboard - conversational agent server
//!
//! Each user message runs a small routing pipeline: a classifier decides
//! between a live weather lookup and a direct language-model reply.

mod api;
mod config;
mod llm;
mod session;
mod tools;
mod turn;

#[cfg(test)]
mod testing;

use api::{create_router, AppState};
use config::AppConfig;
use llm::{LlmService, LoggingService, OpenAICompatService};
use session::AgentConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tools::{OpenMeteoClient, WeatherProvider};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use turn::TurnOrchestrator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "switchboard=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Missing credentials abort startup
    let config = AppConfig::from_env()
        .inspect_err(|e| tracing::error!(error = %e, "Invalid configuration"))?;

    let provider = OpenAICompatService::new(
        config.llm.api_key.clone(),
        config.llm.model.clone(),
        config.llm.base_url.as_deref(),
        config.llm.provider,
    )?;
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(provider)));

    tracing::info!(
        provider = config.llm.provider.display_name(),
        model = %config.llm.model,
        temperature = config.llm.temperature,
        "LLM provider initialized"
    );

    let weather: Arc<dyn WeatherProvider> = Arc::new(OpenMeteoClient::new(&config.weather)?);

    let orchestrator = Arc::new(TurnOrchestrator::new(&config, llm, weather));
    let state = AppState::new(
        orchestrator,
        AgentConfig {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
        },
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Switchboard server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
