//! Thunderstorm forecasting
//!
//! The pipeline talks to the model through [`TrainableForecaster`], so the
//! seasonal regressor can be swapped without touching the services. Only the
//! six raw weather columns are fed to the model; the engineered features are
//! kept for inspection.

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};

use shared::{FeaturedRecord, ForecastPoint, WeatherObservation};

use crate::error::AppResult;

pub mod model;
pub mod seasonal;

pub use model::{load_model, save_model, SeasonBlock, TrainedModel, MODEL_SCHEMA_VERSION};
pub use seasonal::SeasonalRegressor;

/// External regressors, in design-matrix order
pub const REGRESSOR_NAMES: [&str; 6] = [
    "temperature",
    "humidity",
    "pressure",
    "wind_speed_kmph",
    "cloud_cover",
    "precipitation",
];

pub type RegressorRow = [f64; REGRESSOR_NAMES.len()];

/// A model artifact that can check itself against the running schema
pub trait ModelArtifact: Serialize + DeserializeOwned + Send + Sync {
    fn check_schema(&self) -> AppResult<()>;

    /// Fitted effect of one raw unit of each regressor, for reporting
    fn regressor_effects(&self) -> Vec<(String, f64)>;
}

/// Fit-then-score capability
pub trait TrainableForecaster: Send + Sync {
    type Model: ModelArtifact;

    fn name(&self) -> &'static str;

    /// Fit on a featured series; the target is the thunderstorm label
    fn train(&self, series: &[FeaturedRecord]) -> AppResult<Self::Model>;

    /// Score `horizon_hours` hourly steps starting at `start`
    fn score(
        &self,
        model: &Self::Model,
        latest: &WeatherObservation,
        start: DateTime<Utc>,
        horizon_hours: u32,
    ) -> AppResult<Vec<ForecastPoint>>;
}

/// Regressor values of one training row
pub fn regressor_row(record: &FeaturedRecord) -> RegressorRow {
    [
        record.temperature,
        record.humidity,
        record.pressure,
        record.wind_speed_kmph,
        record.cloud_cover,
        record.precipitation,
    ]
}

/// Future frame: every step repeats the latest observation. Wind is converted
/// to km/h and precipitation is held at zero.
pub fn future_frame(
    latest: &WeatherObservation,
    start: DateTime<Utc>,
    horizon_hours: u32,
) -> Vec<(DateTime<Utc>, RegressorRow)> {
    let row = [
        latest.temperature,
        latest.humidity,
        latest.pressure,
        latest.wind_speed_kmph(),
        latest.cloud_cover,
        0.0,
    ];

    (0..horizon_hours)
        .map(|step| (start + Duration::hours(i64::from(step)), row))
        .collect()
}
