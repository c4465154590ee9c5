//! Mock implementations for testing
//!
//! These mocks let the turn pipeline and HTTP layer run without real I/O.

use crate::config::{AppConfig, LlmConfig, RoutingConfig, WeatherConfig};
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService, Provider, Usage};
use crate::tools::{CurrentConditions, GeoLocation, WeatherError, WeatherProvider};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Configuration with fixed test values; no environment access
pub fn test_config() -> AppConfig {
    AppConfig {
        port: 0,
        llm: LlmConfig {
            provider: Provider::Groq,
            api_key: "test-key".to_string(),
            base_url: None,
            model: "test-model".to_string(),
            temperature: 0.7,
        },
        weather: WeatherConfig::default(),
        routing: RoutingConfig::default(),
    }
}

// ============================================================================
// Mock LLM Service
// ============================================================================

/// Mock LLM service that returns queued responses
pub struct MockLlmService {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful text completion
    pub fn queue_text(&self, text: &str) {
        let usage = Usage {
            input_tokens: 20,
            output_tokens: 5,
        };
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(LlmResponse::new(text, usage)));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Mock Weather Provider
// ============================================================================

/// Mock geocoding/forecast provider with predefined answers.
///
/// Unknown places geocode to `None`, matching an empty provider result.
#[derive(Default)]
pub struct MockWeatherProvider {
    locations: HashMap<String, GeoLocation>,
    conditions: CurrentConditions,
    geocode_status: Option<u16>,
    forecast_status: Option<u16>,
    geocodes: Mutex<Vec<String>>,
    forecasts: Mutex<Vec<(f64, f64)>>,
}

impl MockWeatherProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(mut self, place: impl Into<String>, location: GeoLocation) -> Self {
        self.locations.insert(place.into(), location);
        self
    }

    pub fn with_conditions(mut self, conditions: CurrentConditions) -> Self {
        self.conditions = conditions;
        self
    }

    /// Make every geocoding call fail with the given HTTP status
    pub fn failing_geocode(mut self, status: u16) -> Self {
        self.geocode_status = Some(status);
        self
    }

    /// Make every forecast call fail with the given HTTP status
    pub fn failing_forecast(mut self, status: u16) -> Self {
        self.forecast_status = Some(status);
        self
    }

    pub fn recorded_geocodes(&self) -> Vec<String> {
        self.geocodes.lock().unwrap().clone()
    }

    pub fn recorded_forecasts(&self) -> Vec<(f64, f64)> {
        self.forecasts.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherProvider for MockWeatherProvider {
    async fn geocode(&self, place: &str) -> Result<Option<GeoLocation>, WeatherError> {
        self.geocodes.lock().unwrap().push(place.to_string());
        if let Some(status) = self.geocode_status {
            return Err(WeatherError::Status {
                service: "geocoding",
                status,
            });
        }
        Ok(self.locations.get(place).cloned())
    }

    async fn current_conditions(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<CurrentConditions, WeatherError> {
        self.forecasts.lock().unwrap().push((latitude, longitude));
        if let Some(status) = self.forecast_status {
            return Err(WeatherError::Status {
                service: "forecast",
                status,
            });
        }
        Ok(self.conditions.clone())
    }
}
