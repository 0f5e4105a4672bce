//! Weather API client for fetching current conditions
//!
//! Integrates with the OpenWeatherMap current-weather endpoint. One call per
//! scheduled tick; no retries.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use shared::{validate_readings, Readings};

use crate::config::WeatherConfig;
use crate::error::{AppError, AppResult};

const USER_AGENT: &str = concat!("thundercast/", env!("CARGO_PKG_VERSION"));

/// Weather API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// Current conditions at the requested coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Instant the provider says the data was calculated
    pub observed_at: DateTime<Utc>,
    pub readings: Readings,
    /// Provider's name for the nearest station, if any
    pub station_name: Option<String>,
}

/// OpenWeatherMap API response for current weather
#[derive(Debug, Deserialize)]
struct OWMCurrentResponse {
    main: OWMMain,
    wind: OWMWind,
    clouds: OWMClouds,
    dt: i64,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OWMMain {
    temp: f64,
    pressure: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OWMWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OWMClouds {
    all: f64,
}

impl WeatherClient {
    /// Create a new WeatherClient from configuration
    pub fn new(config: &WeatherConfig) -> AppResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AppError::Configuration(
                "weather.api_key is not set (THUNDERCAST__WEATHER__API_KEY)".into(),
            ));
        }
        Self::build(
            config.api_key.clone(),
            config.api_endpoint.clone(),
            config.request_timeout(),
        )
    }

    /// Create a new WeatherClient with custom base URL (for testing)
    pub fn with_base_url(api_key: String, base_url: String) -> AppResult<Self> {
        Self::build(api_key, base_url, Duration::from_secs(10))
    }

    fn build(api_key: String, base_url: String, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch current weather conditions by GPS coordinates
    pub async fn get_current_conditions(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> AppResult<CurrentConditions> {
        let url = format!("{}/weather", self.base_url);
        let lat = latitude.to_string();
        let lon = longitude.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| AppError::NetworkFailure(format!("Weather API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::NetworkFailure(format!(
                "Weather API error: {} - {}",
                status, body
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::NetworkFailure(format!("Weather API body read failed: {}", e)))?;

        parse_current_response(&body)
    }
}

/// Decode and sanity-check a current-weather body
pub fn parse_current_response(body: &[u8]) -> AppResult<CurrentConditions> {
    let data: OWMCurrentResponse = serde_json::from_slice(body)
        .map_err(|e| AppError::MalformedPayload(format!("Failed to parse weather response: {}", e)))?;

    let observed_at = DateTime::from_timestamp(data.dt, 0)
        .ok_or_else(|| AppError::MalformedPayload(format!("Invalid timestamp dt={}", data.dt)))?;

    let readings = Readings {
        temperature: data.main.temp,
        humidity: data.main.humidity,
        pressure: data.main.pressure,
        wind_speed: data.wind.speed,
        cloud_cover: data.clouds.all,
    };
    validate_readings(&readings).map_err(|e| AppError::MalformedPayload(e.to_string()))?;

    Ok(CurrentConditions {
        observed_at,
        readings,
        station_name: data.name.filter(|n| !n.is_empty()),
    })
}
