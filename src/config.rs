//! Process configuration
//!
//! Read once at startup and passed explicitly into the components that need it.

use crate::llm::Provider;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_WEATHER_TIMEOUT: Duration = Duration::from_secs(15);

/// Keywords that send a turn to the tool when the classification call is unusable
pub const PLANNER_FALLBACK_KEYWORDS: &[&str] = &[
    "weather",
    "temperature",
    "forecast",
    "latest",
    "news",
    "price",
    "today",
    "now",
];

/// Keywords the routing function checks when no usable routing tag is present
pub const ROUTE_FALLBACK_KEYWORDS: &[&str] = &["weather"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is missing. Set GROQ_API_KEY or OPENAI_API_KEY")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Language-model provider settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: Provider,
    pub api_key: String,
    /// Chat-completions endpoint override
    pub base_url: Option<String>,
    pub model: String,
    /// Sampling temperature for direct replies
    pub temperature: f32,
}

/// Geocoding and forecast provider settings
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub geocoding_url: String,
    pub forecast_url: String,
    pub timeout: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            timeout: DEFAULT_WEATHER_TIMEOUT,
        }
    }
}

/// The two keyword fallback policies, configured independently
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingConfig {
    pub planner_keywords: Vec<String>,
    pub route_keywords: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            planner_keywords: to_owned_list(PLANNER_FALLBACK_KEYWORDS),
            route_keywords: to_owned_list(ROUTE_FALLBACK_KEYWORDS),
        }
    }
}

/// Full application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub llm: LlmConfig,
    pub weather: WeatherConfig,
    pub routing: RoutingConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var("SWITCHBOARD_PORT") {
            Some(raw) => parse_value("SWITCHBOARD_PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let (provider, api_key) = if let Some(key) = var("GROQ_API_KEY") {
            (Provider::Groq, key)
        } else if let Some(key) = var("OPENAI_API_KEY") {
            (Provider::OpenAI, key)
        } else {
            return Err(ConfigError::Missing("LLM API key"));
        };

        let temperature = match var("DEFAULT_TEMPERATURE") {
            Some(raw) => {
                let t: f32 = parse_value("DEFAULT_TEMPERATURE", &raw)?;
                if !(0.0..=2.0).contains(&t) {
                    return Err(ConfigError::Invalid {
                        name: "DEFAULT_TEMPERATURE",
                        value: raw,
                        reason: "must be between 0 and 2".to_string(),
                    });
                }
                t
            }
            None => DEFAULT_TEMPERATURE,
        };

        let llm = LlmConfig {
            provider,
            api_key,
            base_url: var("LLM_BASE_URL"),
            model: var("DEFAULT_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            temperature,
        };

        let timeout = match var("WEATHER_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_value("WEATHER_TIMEOUT_SECS", &raw)?),
            None => DEFAULT_WEATHER_TIMEOUT,
        };

        let weather = WeatherConfig {
            geocoding_url: var("GEOCODING_URL").unwrap_or_else(|| DEFAULT_GEOCODING_URL.to_string()),
            forecast_url: var("FORECAST_URL").unwrap_or_else(|| DEFAULT_FORECAST_URL.to_string()),
            timeout,
        };

        let defaults = RoutingConfig::default();
        let routing = RoutingConfig {
            planner_keywords: var("PLANNER_FALLBACK_KEYWORDS")
                .map_or(defaults.planner_keywords, |raw| parse_keywords(&raw)),
            route_keywords: var("ROUTE_FALLBACK_KEYWORDS")
                .map_or(defaults.route_keywords, |raw| parse_keywords(&raw)),
        };

        Ok(Self {
            port,
            llm,
            weather,
            routing,
        })
    }
}

fn parse_value<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Comma-separated, lowercased, blanks dropped
fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn to_owned_list(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}
