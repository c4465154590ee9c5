//! Weather tool: pulls a place name out of free text and reports current conditions

use super::{WeatherError, WeatherProvider};
use crate::turn::{ConversationState, ToolCallRecord};
use regex::Regex;
use serde_json::json;
use std::sync::{Arc, LazyLock};

/// Reply when no location can be read from the utterance
pub const NO_TOOL_REPLY: &str = "Tool not available for this request yet.";

pub const TOOL_NAME: &str = "get_weather";

/// "weather in Boston", "What is the weather at Lake Tahoe?"
static WEATHER_IN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)weather\s+(?:in|at)\s+([A-Za-z .'-]+)").expect("valid weather-in pattern")
});

/// Trailing "... in Boston?" fallback
static TRAILING_IN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bin\s+([A-Za-z .'-]+)\??$").expect("valid trailing-in pattern")
});

/// Time words the place pattern swallows; cut from the end of a capture.
/// Multi-word entries come first so "right now" wins over "now".
const TRAILING_QUALIFIERS: &[&str] = &[
    "right now",
    "this morning",
    "this afternoon",
    "this evening",
    "this weekend",
    "this week",
    "currently",
    "tomorrow",
    "tonight",
    "today",
    "now",
];

/// Extract a place name from free text
pub fn extract_location(text: &str) -> Option<String> {
    let captured = WEATHER_IN_RE
        .captures(text)
        .or_else(|| TRAILING_IN_RE.captures(text.trim()))?;
    let place = strip_trailing_qualifiers(captured.get(1)?.as_str());
    (!place.is_empty()).then_some(place)
}

fn strip_trailing_qualifiers(raw: &str) -> String {
    let mut place = raw.trim_end_matches([' ', '.']).trim_start().to_string();

    'outer: loop {
        let lower = place.to_ascii_lowercase();
        for qualifier in TRAILING_QUALIFIERS {
            let cut = if lower == *qualifier {
                Some(0)
            } else if lower.ends_with(&format!(" {qualifier}")) {
                Some(lower.len() - qualifier.len() - 1)
            } else {
                None
            };

            if let Some(len) = cut {
                place.truncate(len);
                let trimmed_len = place.trim_end_matches([' ', '.']).len();
                place.truncate(trimmed_len);
                continue 'outer;
            }
        }
        return place;
    }
}

fn not_found_reply(place: &str) -> String {
    format!("I couldn't find coordinates for '{place}'. Try a bigger city name (e.g., 'Boston, MA').")
}

/// Dispatches weather requests to the configured provider
pub struct WeatherTool {
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherTool {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// Answer the latest utterance. Always leaves a non-empty `response` on `Ok`.
    pub async fn run(&self, state: &mut ConversationState) -> Result<(), WeatherError> {
        let Some(place) = extract_location(state.utterance()) else {
            tracing::info!(session_id = %state.session_id, "No location in request, tool unavailable");
            state.reply(NO_TOOL_REPLY);
            return Ok(());
        };

        tracing::info!(session_id = %state.session_id, location = %place, "Looking up weather");
        state.tool_calls.push(ToolCallRecord {
            name: TOOL_NAME.to_string(),
            arguments: json!({ "location": place }),
        });

        let reply = self.summarize(&place).await?;
        state.reply(reply);
        Ok(())
    }

    async fn summarize(&self, place: &str) -> Result<String, WeatherError> {
        let Some(location) = self.provider.geocode(place).await? else {
            return Ok(not_found_reply(place));
        };

        let current = self
            .provider
            .current_conditions(location.latitude, location.longitude)
            .await?;

        Ok(format!(
            "Weather for {} right now:\n\
             - Temperature: {}°C (feels like {}°C)\n\
             - Precipitation: {} mm\n\
             - Wind: {} km/h",
            location.display_name(),
            current.reading("temperature_2m"),
            current.reading("apparent_temperature"),
            current.reading("precipitation"),
            current.reading("wind_speed_10m"),
        ))
    }
}
