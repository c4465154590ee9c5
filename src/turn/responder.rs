//! Responder: direct conversational reply from the language model

use super::state::ConversationState;
use crate::llm::{LlmError, LlmRequest, LlmService};
use std::sync::Arc;

const ASSISTANT_PROMPT: &str = "You are a helpful assistant.";

pub struct Responder {
    llm: Arc<dyn LlmService>,
    temperature: f32,
}

impl Responder {
    pub fn new(llm: Arc<dyn LlmService>, temperature: f32) -> Self {
        Self { llm, temperature }
    }

    /// Generate and record a reply. Provider failures propagate; there is no fallback text.
    pub async fn run(&self, state: &mut ConversationState) -> Result<(), LlmError> {
        let request = LlmRequest::single_turn(ASSISTANT_PROMPT, state.utterance(), self.temperature);
        let response = self.llm.complete(&request).await?;
        state.usage.record(response.usage);

        let reply = response.text.trim();
        if reply.is_empty() {
            return Err(LlmError::invalid_response("Model returned an empty completion"));
        }

        state.reply(reply);
        Ok(())
    }
}
