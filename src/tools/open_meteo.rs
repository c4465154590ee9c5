//! Open-Meteo geocoding and forecast client (free, no key)

use super::{CurrentConditions, GeoLocation, WeatherError, WeatherProvider};
use crate::config::WeatherConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

const GEOCODING: &str = "geocoding";
const FORECAST: &str = "forecast";

/// Fields requested from the forecast endpoint
pub const CURRENT_FIELDS: &str =
    "temperature_2m,apparent_temperature,precipitation,wind_speed_10m";

pub struct OpenMeteoClient {
    client: Client,
    geocoding_url: String,
    forecast_url: String,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            geocoding_url: config.geocoding_url.clone(),
            forecast_url: config.forecast_url.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| WeatherError::Request { service, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status {
                service,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| WeatherError::Request { service, source })?;

        serde_json::from_str(&body).map_err(|e| WeatherError::Decode {
            service,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn geocode(&self, place: &str) -> Result<Option<GeoLocation>, WeatherError> {
        let query = [
            ("name", place.to_string()),
            ("count", "1".to_string()),
            ("language", "en".to_string()),
            ("format", "json".to_string()),
        ];
        let response: GeocodingResponse = self
            .get_json(GEOCODING, &self.geocoding_url, &query)
            .await?;
        Ok(response.first())
    }

    async fn current_conditions(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<CurrentConditions, WeatherError> {
        let query = [
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("current", CURRENT_FIELDS.to_string()),
            ("timezone", "auto".to_string()),
        ];
        let response: ForecastResponse = self.get_json(FORECAST, &self.forecast_url, &query).await?;
        Ok(CurrentConditions {
            fields: response.current,
        })
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// `results` is omitted entirely when nothing matches
#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

impl GeocodingResponse {
    fn first(self) -> Option<GeoLocation> {
        self.results.into_iter().next().map(|r| GeoLocation {
            name: r.name,
            admin1: r.admin1,
            country: r.country,
            latitude: r.latitude,
            longitude: r.longitude,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    admin1: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    current: Map<String, Value>,
}
