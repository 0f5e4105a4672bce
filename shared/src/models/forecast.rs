//! Thunderstorm forecast rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::RiskLevel;

/// One scored horizon step, before it is tagged for publishing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ForecastPoint {
    pub forecast_time: DateTime<Utc>,
    /// Percent, clamped to `[0, 100]`
    pub probability: f64,
    /// Lower bound of the model's uncertainty interval, same scale
    pub lower_bound: f64,
    /// Upper bound of the model's uncertainty interval, same scale
    pub upper_bound: f64,
}

impl ForecastPoint {
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_probability(self.probability)
    }
}

/// A published forecast row. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastRecord {
    pub id: Uuid,
    pub prediction_time: DateTime<Utc>,
    pub forecast_time: DateTime<Utc>,
    pub thunderstorm_probability: f64,
    pub location: String,
    pub model_version: String,
}

impl ForecastRecord {
    pub fn from_point(
        point: &ForecastPoint,
        prediction_time: DateTime<Utc>,
        location: &str,
        model_version: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            prediction_time,
            forecast_time: point.forecast_time,
            thunderstorm_probability: point.probability,
            location: location.to_string(),
            model_version: model_version.to_string(),
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_probability(self.thunderstorm_probability)
    }
}
