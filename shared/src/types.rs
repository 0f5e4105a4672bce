//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// A named observation site
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(city: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            city: city.into(),
            latitude,
            longitude,
        }
    }
}

/// Thunderstorm risk band shown next to a probability
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    /// Probability strictly above this is high risk
    pub const HIGH_THRESHOLD: f64 = 70.0;
    /// Probability strictly above this is at least moderate risk
    pub const MODERATE_THRESHOLD: f64 = 40.0;

    /// Band a probability in percent. Both bounds are exclusive, so exactly
    /// 70.0 is moderate and exactly 40.0 is low.
    pub fn from_probability(probability: f64) -> Self {
        if probability > Self::HIGH_THRESHOLD {
            RiskLevel::High
        } else if probability > Self::MODERATE_THRESHOLD {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Clamp a raw model output, already scaled to percent, into `[0, 100]`.
///
/// Returns `None` for NaN or infinite input so callers can abort the cycle
/// instead of publishing a meaningless number.
pub fn clamp_probability(raw_percent: f64) -> Option<f64> {
    if raw_percent.is_finite() {
        Some(raw_percent.clamp(0.0, 100.0))
    } else {
        None
    }
}
