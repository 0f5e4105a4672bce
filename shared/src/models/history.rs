//! Historical rows used for training

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the historical dataset. Any weather column may be missing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawHistoryRow {
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed_kmph: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub precipitation: Option<f64>,
}

/// A raw row projected to the model's columns plus the storm label
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleanedRecord {
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed_kmph: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub precipitation: Option<f64>,
    pub thunderstorm: bool,
}
