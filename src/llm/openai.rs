//! `OpenAI`-compatible chat completions client (Groq, `OpenAI`)

use super::types::{LlmRequest, LlmResponse, Usage};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Providers speaking the chat/completions wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Groq,
    OpenAI,
}

impl Provider {
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Groq => "Groq",
            Provider::OpenAI => "OpenAI",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::Groq => "https://api.groq.com/openai/v1/chat/completions",
            Provider::OpenAI => "https://api.openai.com/v1/chat/completions",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Groq => "llama-3.3-70b-versatile",
            Provider::OpenAI => "gpt-4o-mini",
        }
    }
}

/// OpenAI-compatible service implementation
pub struct OpenAICompatService {
    client: Client,
    api_key: String,
    base_url: String,
    model_id: String,
}

impl OpenAICompatService {
    pub fn new(
        api_key: String,
        model_id: String,
        base_url: Option<&str>,
        provider: Provider,
    ) -> Result<Self, LlmError> {
        let base_url = base_url
            .unwrap_or_else(|| provider.default_base_url())
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url,
            model_id,
        })
    }

    fn translate_request(&self, request: &LlmRequest) -> OpenAIRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if !request.system.is_empty() {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: Some(request.system.clone()),
            });
        }

        messages.extend(request.messages.iter().map(|msg| OpenAIMessage {
            role: msg.role.as_str().to_string(),
            content: Some(msg.content.clone()),
        }));

        OpenAIRequest {
            model: self.model_id.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: Some(request.temperature),
            stream: false,
        }
    }

    fn normalize_response(resp: OpenAIResponse) -> Result<LlmResponse, LlmError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::invalid_response("No choices in response"))?;

        let usage = resp.usage.map_or_else(Usage::default, |u| Usage {
            input_tokens: u64::from(u.prompt_tokens),
            output_tokens: u64::from(u.completion_tokens),
        });

        Ok(LlmResponse::new(
            choice.message.content.unwrap_or_default(),
            usage,
        ))
    }
}

#[async_trait]
impl LlmService for OpenAICompatService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let openai_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            if let Ok(error_resp) = serde_json::from_str::<OpenAIErrorResponse>(&body) {
                return Err(LlmError::from_status(status.as_u16(), &error_resp.error.message));
            }
            return Err(LlmError::from_status(status.as_u16(), &body));
        }

        let openai_response: OpenAIResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::invalid_response(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(openai_response)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}
