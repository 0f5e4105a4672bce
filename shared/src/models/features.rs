//! Feature-engineered training rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Four-bucket season used by the feature builder
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Summer,
    Monsoon,
    PostMonsoon,
    Winter,
}

impl Season {
    /// Map a calendar month (1-12) to its season
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Summer,
            6..=9 => Season::Monsoon,
            10 | 11 => Season::PostMonsoon,
            _ => Season::Winter,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Summer => "summer",
            Season::Monsoon => "monsoon",
            Season::PostMonsoon => "post_monsoon",
            Season::Winter => "winter",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cleaned record with every derived feature defined
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeaturedRecord {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed_kmph: f64,
    pub cloud_cover: f64,
    pub precipitation: f64,
    pub thunderstorm: bool,

    // Calendar
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    /// 0 = Monday
    pub day_of_week: u32,
    pub day_of_year: u32,
    pub season: Season,

    // Interactions
    pub temp_humidity: f64,
    pub pressure_wind: f64,
    pub humidity_pressure_ratio: f64,

    // Lags and changes
    pub temp_lag_1h: f64,
    pub humidity_lag_1h: f64,
    pub pressure_lag_1h: f64,
    pub temp_change: f64,
    pub pressure_change: f64,

    // Rolling statistics
    pub temp_rolling_3h: f64,
    pub humidity_rolling_3h: f64,
    pub pressure_rolling_6h: f64,
    pub temp_rolling_std_3h: f64,

    // Cyclical encodings
    pub hour_sin: f64,
    pub hour_cos: f64,
    pub month_sin: f64,
    pub month_cos: f64,
}

impl FeaturedRecord {
    /// Storm label as the 0/1 regression target
    pub fn target(&self) -> f64 {
        if self.thunderstorm {
            1.0
        } else {
            0.0
        }
    }
}
