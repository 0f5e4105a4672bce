//! Live weather observations collected by the ingestor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Location;

/// Metres per second to kilometres per hour
pub const MPS_TO_KMPH: f64 = 3.6;

/// Current conditions as reported by the weather source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Readings {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    /// Metres per second
    pub wind_speed: f64,
    pub cloud_cover: f64,
}

/// One stored observation. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherObservation {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Degrees Celsius
    pub temperature: f64,
    /// Percent
    pub humidity: f64,
    /// Hectopascal
    pub pressure: f64,
    /// Metres per second
    pub wind_speed: f64,
    /// Percent
    pub cloud_cover: f64,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl WeatherObservation {
    /// Build a fresh observation for `location` at the server-reported instant
    pub fn new(timestamp: DateTime<Utc>, readings: Readings, location: &Location) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            temperature: readings.temperature,
            humidity: readings.humidity,
            pressure: readings.pressure,
            wind_speed: readings.wind_speed,
            cloud_cover: readings.cloud_cover,
            location: location.city.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }

    /// Wind speed in the unit the forecasting model was trained on
    pub fn wind_speed_kmph(&self) -> f64 {
        self.wind_speed * MPS_TO_KMPH
    }
}
