//! Planner: decides whether a turn needs the tool or a direct reply

use super::route::contains_keyword;
use super::state::{ConversationState, NextNode};
use crate::llm::{LlmError, LlmRequest, LlmService, Usage};
use std::sync::Arc;

const ROUTING_PROMPT: &str = "You are a routing assistant.
Decide if the user needs an external tool (up-to-date / factual lookup like weather, news, prices, real-time info).
If yes, output ONLY: TOOL
If no, output ONLY: RESPONDER
";

/// The answer is a single token
const CLASSIFICATION_MAX_TOKENS: u32 = 8;

/// Parsed output of the classification call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Tool,
    Responder,
    /// The model answered with something other than the two accepted tokens
    Unrecognized,
}

impl Classification {
    /// Trim, uppercase, and accept only `TOOL` or `RESPONDER`
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "TOOL" => Classification::Tool,
            "RESPONDER" => Classification::Responder,
            _ => Classification::Unrecognized,
        }
    }
}

/// Deterministic keyword routing used when classification is unusable
pub fn keyword_fallback(utterance: &str, keywords: &[String]) -> NextNode {
    if contains_keyword(utterance, keywords) {
        NextNode::Tool
    } else {
        NextNode::Responder
    }
}

/// Combine the classification outcome with the keyword fallback
pub fn decide(
    classification: &Result<Classification, LlmError>,
    utterance: &str,
    keywords: &[String],
) -> NextNode {
    match classification {
        Ok(Classification::Tool) => NextNode::Tool,
        Ok(Classification::Responder) => NextNode::Responder,
        Ok(Classification::Unrecognized) | Err(_) => keyword_fallback(utterance, keywords),
    }
}

pub struct Planner {
    llm: Arc<dyn LlmService>,
    fallback_keywords: Vec<String>,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmService>, fallback_keywords: Vec<String>) -> Self {
        Self {
            llm,
            fallback_keywords,
        }
    }

    async fn classify(&self, utterance: &str) -> Result<(Classification, Usage), LlmError> {
        let request = LlmRequest::single_turn(ROUTING_PROMPT, utterance, 0.0)
            .with_max_tokens(CLASSIFICATION_MAX_TOKENS);
        let response = self.llm.complete(&request).await?;
        Ok((Classification::parse(&response.text), response.usage))
    }

    /// Write the routing decision into `state.next_node`. Never fails.
    pub async fn run(&self, state: &mut ConversationState) {
        let utterance = state.utterance().to_string();

        let classification = match self.classify(&utterance).await {
            Ok((classification, usage)) => {
                state.usage.record(usage);
                Ok(classification)
            }
            Err(e) => Err(e),
        };

        match &classification {
            Ok(Classification::Unrecognized) => {
                tracing::warn!(
                    session_id = %state.session_id,
                    "Unrecognized classification output, using keyword fallback"
                );
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %state.session_id,
                    error = %e,
                    "Classification call failed, using keyword fallback"
                );
            }
            Ok(_) => {}
        }

        let decision = decide(&classification, &utterance, &self.fallback_keywords);
        tracing::debug!(
            session_id = %state.session_id,
            decision = decision.as_str(),
            "Routing decision"
        );
        state.next_node = Some(decision);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingConfig;
    use crate::testing::MockLlmService;
    use proptest::prelude::*;

    fn keywords() -> Vec<String> {
        RoutingConfig::default().planner_keywords
    }

    fn planner(llm: &Arc<MockLlmService>) -> Planner {
        Planner::new(llm.clone(), keywords())
    }

    #[test]
    fn test_parse_classification() {
        assert_eq!(Classification::parse("TOOL"), Classification::Tool);
        assert_eq!(Classification::parse("  tool\n"), Classification::Tool);
        assert_eq!(Classification::parse("Responder"), Classification::Responder);
        assert_eq!(Classification::parse("TOOL."), Classification::Unrecognized);
        assert_eq!(Classification::parse("I think TOOL"), Classification::Unrecognized);
        assert_eq!(Classification::parse(""), Classification::Unrecognized);
    }

    #[test]
    fn test_model_decision_overrides_keywords() {
        let ok_responder = Ok(Classification::Responder);
        assert_eq!(decide(&ok_responder, "weather now", &keywords()), NextNode::Responder);

        let ok_tool = Ok(Classification::Tool);
        assert_eq!(decide(&ok_tool, "tell me a joke", &keywords()), NextNode::Tool);
    }

    #[test]
    fn test_failure_uses_keyword_fallback() {
        let err = Err(LlmError::network("down"));
        assert_eq!(decide(&err, "Latest NEWS please", &keywords()), NextNode::Tool);
        assert_eq!(decide(&err, "write a poem", &keywords()), NextNode::Responder);

        let garbage = Ok(Classification::Unrecognized);
        assert_eq!(decide(&garbage, "what's the price of gold", &keywords()), NextNode::Tool);
    }

    #[tokio::test]
    async fn test_run_uses_model_output() {
        let llm = Arc::new(MockLlmService::new("test-model"));
        llm.queue_text(" tool ");
        let mut state = ConversationState::for_turn("s", vec![], "tell me a joke");

        planner(&llm).run(&mut state).await;

        assert_eq!(state.next_node, Some(NextNode::Tool));
        assert_eq!(state.usage.llm_calls, 1);
    }

    #[tokio::test]
    async fn test_run_sends_deterministic_classification_request() {
        let llm = Arc::new(MockLlmService::new("test-model"));
        llm.queue_text("RESPONDER");
        let mut state = ConversationState::for_turn("s", vec![], "hello there");

        planner(&llm).run(&mut state).await;

        let requests = llm.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system, ROUTING_PROMPT);
        assert!(requests[0].temperature.abs() < f32::EPSILON);
        assert_eq!(requests[0].max_tokens, Some(CLASSIFICATION_MAX_TOKENS));
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[0].messages[0].content, "hello there");
        assert_eq!(state.next_node, Some(NextNode::Responder));
    }

    #[tokio::test]
    async fn test_run_survives_provider_error() {
        let llm = Arc::new(MockLlmService::new("test-model"));
        llm.queue_error(LlmError::server_error("boom"));
        let mut state = ConversationState::for_turn("s", vec![], "forecast for tomorrow");

        planner(&llm).run(&mut state).await;

        assert_eq!(state.next_node, Some(NextNode::Tool));
        assert_eq!(state.usage.llm_calls, 0);
    }

    #[tokio::test]
    async fn test_run_classifies_latest_user_message() {
        let llm = Arc::new(MockLlmService::new("test-model"));
        llm.queue_text("RESPONDER");
        let mut state = ConversationState::default();
        state.messages = vec![
            crate::turn::Message::user("weather in Oslo"),
            crate::turn::Message::assistant("It is cold."),
            crate::turn::Message::user("thanks!"),
        ];

        planner(&llm).run(&mut state).await;

        assert_eq!(llm.recorded_requests()[0].messages[0].content, "thanks!");
    }

    fn arb_outcome() -> impl Strategy<Value = Result<Classification, LlmError>> {
        prop_oneof![
            Just(Ok(Classification::Tool)),
            Just(Ok(Classification::Responder)),
            Just(Ok(Classification::Unrecognized)),
            Just(Err(LlmError::network("offline"))),
            Just(Err(LlmError::auth("bad key"))),
        ]
    }

    proptest! {
        #[test]
        fn prop_decision_is_always_tool_or_responder(
            outcome in arb_outcome(),
            utterance in ".{0,80}",
        ) {
            let decision = decide(&outcome, &utterance, &keywords());
            prop_assert!(matches!(decision.as_str(), "tool" | "responder"));
        }

        #[test]
        fn prop_keyword_fallback_is_deterministic(utterance in ".{0,80}") {
            let first = keyword_fallback(&utterance, &keywords());
            let second = keyword_fallback(&utterance, &keywords());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_raw_model_output_never_escapes(raw in ".{0,20}", utterance in "[a-z ]{0,40}") {
            let decision = decide(&Ok(Classification::parse(&raw)), &utterance, &keywords());
            prop_assert!(decision == NextNode::Tool || decision == NextNode::Responder);
        }
    }
}
