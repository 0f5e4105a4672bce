//! Prediction cycle: latest observation → model → published forecasts

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use shared::{ForecastPoint, ForecastRecord};

use super::PublisherService;
use crate::config::ForecastConfig;
use crate::error::{AppError, AppResult};
use crate::forecasting::{load_model, SeasonalRegressor, TrainableForecaster};
use crate::store::WeatherStore;

/// What one scoring cycle produced
#[derive(Debug, Clone, Serialize)]
pub struct CycleOutcome {
    pub prediction_time: DateTime<Utc>,
    pub observation_time: DateTime<Utc>,
    pub location: String,
    pub published: u64,
    pub points: Vec<ForecastPoint>,
}

pub struct PredictionService<F: TrainableForecaster = SeasonalRegressor> {
    store: Arc<dyn WeatherStore>,
    publisher: PublisherService,
    forecaster: F,
    model_path: PathBuf,
    horizon_hours: u32,
    model_version: String,
}

impl PredictionService<SeasonalRegressor> {
    pub fn new(store: Arc<dyn WeatherStore>, config: &ForecastConfig) -> Self {
        Self::with_forecaster(store, config, SeasonalRegressor::default())
    }
}

impl<F: TrainableForecaster> PredictionService<F> {
    pub fn with_forecaster(store: Arc<dyn WeatherStore>, config: &ForecastConfig, forecaster: F) -> Self {
        Self {
            publisher: PublisherService::new(store.clone()),
            store,
            forecaster,
            model_path: config.model_path.clone(),
            horizon_hours: config.horizon_hours,
            model_version: config.model_version.clone(),
        }
    }

    pub async fn run_cycle(&self) -> AppResult<CycleOutcome> {
        self.run_cycle_at(Utc::now()).await
    }

    /// Score from `now` and publish. A scoring failure publishes nothing.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> AppResult<CycleOutcome> {
        let model: F::Model = load_model(&self.model_path)?;

        let latest = self
            .store
            .latest_observation()
            .await?
            .ok_or(AppError::NoObservations)?;

        let points = self
            .forecaster
            .score(&model, &latest, now, self.horizon_hours)?;

        let rows: Vec<ForecastRecord> = points
            .iter()
            .map(|p| ForecastRecord::from_point(p, now, &latest.location, &self.model_version))
            .collect();
        let published = self.publisher.publish(&rows).await?;

        for point in &points {
            tracing::debug!(
                forecast_time = %point.forecast_time,
                probability = point.probability,
                risk = %point.risk_level(),
                "Forecast step"
            );
        }
        tracing::info!(
            forecaster = self.forecaster.name(),
            observed_at = %latest.timestamp,
            steps = points.len(),
            "Prediction cycle complete"
        );

        Ok(CycleOutcome {
            prediction_time: now,
            observation_time: latest.timestamp,
            location: latest.location,
            published,
            points,
        })
    }
}
