//! Tool dispatch: location-based weather lookup
//!
//! The dispatcher only knows the `WeatherProvider` seam. `OpenMeteoClient` is
//! the production implementation; tests swap in a mock.

mod open_meteo;
mod weather;

pub use open_meteo::OpenMeteoClient;
pub use weather::WeatherTool;
#[cfg(test)]
pub use weather::NO_TOOL_REPLY;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Geocoding or forecast provider failure. Fatal for the turn.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("{service} request failed: {source}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },
    #[error("{service} response could not be decoded: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

/// First geocoding candidate for a place name
#[derive(Debug, Clone, PartialEq)]
pub struct GeoLocation {
    pub name: String,
    pub admin1: Option<String>,
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    /// `"<name>, <admin-region>, <country>"` with empty segments dropped
    pub fn display_name(&self) -> String {
        [
            Some(self.name.as_str()),
            self.admin1.as_deref(),
            self.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Current-conditions object keyed by provider field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentConditions {
    pub fields: Map<String, Value>,
}

impl CurrentConditions {
    /// The raw provider value for `field`, or `n/a` when absent
    pub fn reading(&self, field: &str) -> String {
        match self.fields.get(field) {
            None | Some(Value::Null) => "n/a".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Remote geocoding and forecast lookups
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Resolve a place name; `Ok(None)` when the provider has no match
    async fn geocode(&self, place: &str) -> Result<Option<GeoLocation>, WeatherError>;

    /// Current conditions at the given coordinates
    async fn current_conditions(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<CurrentConditions, WeatherError>;
}
