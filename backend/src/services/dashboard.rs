//! Read models for the dashboard

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use shared::{ForecastRecord, RiskLevel, WeatherObservation};

use crate::error::AppResult;
use crate::store::WeatherStore;

/// Steps averaged for the short-range summary
pub const NEAR_TERM_STEPS: usize = 6;

/// Current conditions card
#[derive(Debug, Clone, Serialize)]
pub struct ObservationView {
    #[serde(flatten)]
    pub observation: WeatherObservation,
    pub wind_speed_kmph: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct MetricStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricStats {
    /// `None` for an empty input
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for value in values {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }
        (count > 0).then(|| Self {
            avg: sum / count as f64,
            min,
            max,
        })
    }
}

/// Observation history, oldest first, with summary statistics
#[derive(Debug, Clone, Serialize)]
pub struct ObservationHistory {
    pub observations: Vec<WeatherObservation>,
    pub temperature: MetricStats,
    pub humidity: MetricStats,
    pub pressure: MetricStats,
    pub wind_speed: MetricStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastView {
    pub id: Uuid,
    pub prediction_time: DateTime<Utc>,
    pub forecast_time: DateTime<Utc>,
    pub thunderstorm_probability: f64,
    pub risk_level: RiskLevel,
    pub location: String,
    pub model_version: String,
}

impl From<ForecastRecord> for ForecastView {
    fn from(record: ForecastRecord) -> Self {
        Self {
            risk_level: record.risk_level(),
            id: record.id,
            prediction_time: record.prediction_time,
            forecast_time: record.forecast_time,
            thunderstorm_probability: record.thunderstorm_probability,
            location: record.location,
            model_version: record.model_version,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ForecastSummary {
    pub max_probability: f64,
    pub max_risk_level: RiskLevel,
    /// Mean over the first few forecast steps
    pub near_term_average: f64,
    pub latest_prediction_time: DateTime<Utc>,
}

/// Forecasts, earliest forecast time first, with a headline summary
#[derive(Debug, Clone, Serialize)]
pub struct ForecastBoard {
    pub forecasts: Vec<ForecastView>,
    pub summary: ForecastSummary,
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn WeatherStore>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn WeatherStore>) -> Self {
        Self { store }
    }

    pub async fn latest_observation(&self) -> AppResult<Option<ObservationView>> {
        Ok(self
            .store
            .latest_observation()
            .await?
            .map(|observation| ObservationView {
                wind_speed_kmph: observation.wind_speed_kmph(),
                observation,
            }))
    }

    pub async fn observation_history(&self, limit: usize) -> AppResult<Option<ObservationHistory>> {
        let mut observations = self.store.latest_observations(limit).await?;
        observations.reverse();
        Ok(summarize_observations(observations))
    }

    pub async fn forecast_board(&self, limit: usize) -> AppResult<Option<ForecastBoard>> {
        let records = self.store.recent_forecasts(limit).await?;
        Ok(summarize_forecasts(records))
    }
}

/// Statistics over an ascending observation list; `None` when empty
pub fn summarize_observations(observations: Vec<WeatherObservation>) -> Option<ObservationHistory> {
    let stats = |f: fn(&WeatherObservation) -> f64| {
        MetricStats::from_values(observations.iter().map(f))
    };

    Some(ObservationHistory {
        temperature: stats(|o| o.temperature)?,
        humidity: stats(|o| o.humidity)?,
        pressure: stats(|o| o.pressure)?,
        wind_speed: stats(|o| o.wind_speed)?,
        observations,
    })
}

/// Sort by forecast time and compute the headline numbers; `None` when empty
pub fn summarize_forecasts(mut records: Vec<ForecastRecord>) -> Option<ForecastBoard> {
    records.sort_by_key(|r| (r.forecast_time, r.prediction_time));

    let latest_prediction_time = records.iter().map(|r| r.prediction_time).max()?;
    let max_probability = records
        .iter()
        .map(|r| r.thunderstorm_probability)
        .fold(f64::NEG_INFINITY, f64::max);
    let near_term = MetricStats::from_values(
        records
            .iter()
            .take(NEAR_TERM_STEPS)
            .map(|r| r.thunderstorm_probability),
    )?;

    Some(ForecastBoard {
        summary: ForecastSummary {
            max_probability,
            max_risk_level: RiskLevel::from_probability(max_probability),
            near_term_average: near_term.avg,
            latest_prediction_time,
        },
        forecasts: records.into_iter().map(ForecastView::from).collect(),
    })
}
