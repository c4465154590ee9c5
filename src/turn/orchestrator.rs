//! Turn orchestrator: planner, then tool or responder, then done

use super::planner::Planner;
use super::responder::Responder;
use super::route::{next_stage, Stage};
use super::state::ConversationState;
use crate::config::AppConfig;
use crate::llm::{LlmError, LlmService};
use crate::tools::{WeatherError, WeatherProvider, WeatherTool};
use std::sync::Arc;
use thiserror::Error;

/// Failures that abort a turn
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Language model request failed: {0}")]
    Llm(#[from] LlmError),
    #[error("Weather lookup failed: {0}")]
    Tool(#[from] WeatherError),
}

/// Built once at startup and shared across turns. Holds no per-turn state.
pub struct TurnOrchestrator {
    planner: Planner,
    tool: WeatherTool,
    responder: Responder,
    route_keywords: Vec<String>,
}

impl TurnOrchestrator {
    pub fn new(
        config: &AppConfig,
        llm: Arc<dyn LlmService>,
        weather: Arc<dyn WeatherProvider>,
    ) -> Self {
        Self {
            planner: Planner::new(llm.clone(), config.routing.planner_keywords.clone()),
            tool: WeatherTool::new(weather),
            responder: Responder::new(llm, config.llm.temperature),
            route_keywords: config.routing.route_keywords.clone(),
        }
    }

    /// Run one turn to completion and return the final state
    pub async fn run(&self, mut state: ConversationState) -> Result<ConversationState, TurnError> {
        let mut stage = Stage::Start;

        loop {
            stage = next_stage(stage, &state, &self.route_keywords);
            tracing::debug!(session_id = %state.session_id, stage = stage.name(), "Entering stage");

            match stage {
                Stage::Start => {}
                Stage::Planner => self.planner.run(&mut state).await,
                Stage::Tool => self.tool.run(&mut state).await?,
                Stage::Responder => self.responder.run(&mut state).await?,
                Stage::End => return Ok(state),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_config, MockLlmService, MockWeatherProvider};
    use crate::tools::{CurrentConditions, GeoLocation, NO_TOOL_REPLY};
    use crate::turn::state::NextNode;
    use crate::turn::{Message, Role};
    use serde_json::json;

    fn orchestrator(
        llm: &Arc<MockLlmService>,
        weather: &Arc<MockWeatherProvider>,
    ) -> TurnOrchestrator {
        TurnOrchestrator::new(&test_config(), llm.clone(), weather.clone())
    }

    fn paris_provider() -> MockWeatherProvider {
        MockWeatherProvider::new()
            .with_location(
                "Paris",
                GeoLocation {
                    name: "Paris".to_string(),
                    admin1: Some("Île-de-France".to_string()),
                    country: Some("France".to_string()),
                    latitude: 48.85,
                    longitude: 2.35,
                },
            )
            .with_conditions(CurrentConditions {
                fields: json!({
                    "temperature_2m": 9.1,
                    "apparent_temperature": 7.4,
                    "precipitation": 0.2,
                    "wind_speed_10m": 14.0,
                })
                .as_object()
                .cloned()
                .unwrap(),
            })
    }

    #[tokio::test]
    async fn test_weather_turn_dispatches_to_tool() {
        let llm = Arc::new(MockLlmService::new("test-model"));
        llm.queue_text("TOOL");
        let weather = Arc::new(paris_provider());
        let state = ConversationState::for_turn("sess", vec![], "weather in Paris");

        let result = orchestrator(&llm, &weather).run(state).await.unwrap();

        assert_eq!(result.next_node, Some(NextNode::Tool));
        assert!(result.response.starts_with("Weather for Paris, Île-de-France, France"));
        assert_eq!(result.messages.len(), 2);
        assert_eq!(result.messages[1].role, Role::Assistant);
        // Only the classification call reached the model
        assert_eq!(llm.recorded_requests().len(), 1);
        assert_eq!(weather.recorded_geocodes(), vec!["Paris".to_string()]);
    }

    #[tokio::test]
    async fn test_weather_turn_with_classifier_down() {
        let llm = Arc::new(MockLlmService::new("test-model"));
        llm.queue_error(LlmError::network("connection refused"));
        let weather = Arc::new(paris_provider());
        let state = ConversationState::for_turn("sess", vec![], "weather in Paris");

        let result = orchestrator(&llm, &weather).run(state).await.unwrap();

        assert_eq!(result.next_node, Some(NextNode::Tool));
        assert!(!result.response.is_empty());
        assert_eq!(result.last_assistant_text(), Some(result.response.as_str()));
    }

    #[tokio::test]
    async fn test_chat_turn_dispatches_to_responder() {
        let llm = Arc::new(MockLlmService::new("test-model"));
        llm.queue_text("RESPONDER");
        llm.queue_text("The Eiffel Tower opened in 1889.");
        let weather = Arc::new(MockWeatherProvider::new());
        let state = ConversationState::for_turn("sess", vec![], "tell me about the Eiffel Tower");

        let result = orchestrator(&llm, &weather).run(state).await.unwrap();

        assert_eq!(result.next_node, Some(NextNode::Responder));
        assert_eq!(result.response, "The Eiffel Tower opened in 1889.");
        assert_eq!(
            result.messages.last(),
            Some(&Message::assistant("The Eiffel Tower opened in 1889."))
        );
        assert_eq!(result.usage.llm_calls, 2);
        assert!(weather.recorded_geocodes().is_empty());
    }

    #[tokio::test]
    async fn test_tool_decision_without_location_falls_back() {
        let llm = Arc::new(MockLlmService::new("test-model"));
        llm.queue_text("TOOL");
        let weather = Arc::new(MockWeatherProvider::new());
        let state = ConversationState::for_turn("sess", vec![], "what's the latest news");

        let result = orchestrator(&llm, &weather).run(state).await.unwrap();

        assert_eq!(result.response, NO_TOOL_REPLY);
    }

    #[tokio::test]
    async fn test_responder_decision_overridden_by_weather_keyword() {
        let llm = Arc::new(MockLlmService::new("test-model"));
        llm.queue_text("RESPONDER");
        let weather = Arc::new(paris_provider());
        let state = ConversationState::for_turn("sess", vec![], "weather in Paris");

        let result = orchestrator(&llm, &weather).run(state).await.unwrap();

        assert!(result.response.starts_with("Weather for Paris"));
        assert_eq!(llm.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_seeded_tag_skips_planner() {
        let llm = Arc::new(MockLlmService::new("test-model"));
        let weather = Arc::new(paris_provider());
        let state = ConversationState::for_turn("sess", vec![], "how is it in Paris")
            .with_routing_tag("TOOLS");

        let result = orchestrator(&llm, &weather).run(state).await.unwrap();

        assert!(result.response.starts_with("Weather for Paris"));
        assert!(llm.recorded_requests().is_empty());
        assert_eq!(result.usage.llm_calls, 0);
    }

    #[tokio::test]
    async fn test_seeded_responder_tag_skips_planner() {
        let llm = Arc::new(MockLlmService::new("test-model"));
        llm.queue_text("Hi there.");
        let weather = Arc::new(MockWeatherProvider::new());
        let state =
            ConversationState::for_turn("sess", vec![], "hello").with_routing_tag("responder");

        let result = orchestrator(&llm, &weather).run(state).await.unwrap();

        assert_eq!(result.response, "Hi there.");
        assert_eq!(llm.recorded_requests().len(), 1);
        assert_eq!(llm.recorded_requests()[0].messages[0].content, "hello");
    }

    #[tokio::test]
    async fn test_generation_failure_is_fatal() {
        let llm = Arc::new(MockLlmService::new("test-model"));
        llm.queue_text("RESPONDER");
        llm.queue_error(LlmError::server_error("overloaded"));
        let weather = Arc::new(MockWeatherProvider::new());
        let state = ConversationState::for_turn("sess", vec![], "write me a haiku");

        let err = orchestrator(&llm, &weather).run(state).await.unwrap_err();

        assert!(matches!(err, TurnError::Llm(_)));
    }

    #[tokio::test]
    async fn test_forecast_outage_is_fatal() {
        let llm = Arc::new(MockLlmService::new("test-model"));
        llm.queue_text("TOOL");
        let weather = Arc::new(paris_provider().failing_forecast(500));
        let state = ConversationState::for_turn("sess", vec![], "weather in Paris");

        let err = orchestrator(&llm, &weather).run(state).await.unwrap_err();

        assert!(matches!(err, TurnError::Tool(WeatherError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_history_is_preserved() {
        let llm = Arc::new(MockLlmService::new("test-model"));
        llm.queue_text("RESPONDER");
        llm.queue_text("You're welcome!");
        let weather = Arc::new(MockWeatherProvider::new());
        let history = vec![
            Message::user("weather in Paris"),
            Message::assistant("Weather for Paris ..."),
        ];
        let state = ConversationState::for_turn("sess", history.clone(), "thanks");

        let result = orchestrator(&llm, &weather).run(state).await.unwrap();

        assert_eq!(result.messages.len(), 4);
        assert_eq!(result.messages[..2], history[..]);
        assert_eq!(llm.recorded_requests()[1].messages[0].content, "thanks");
    }
}
