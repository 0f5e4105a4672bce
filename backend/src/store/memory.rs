//! In-process store backing the test suites

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use shared::{ForecastRecord, WeatherObservation};

use super::WeatherStore;
use crate::error::{AppError, AppResult};

#[derive(Default)]
pub struct MemoryStore {
    observations: RwLock<Vec<WeatherObservation>>,
    forecasts: RwLock<Vec<ForecastRecord>>,
    reject_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with `StoreWriteFailure`
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub async fn observation_count(&self) -> usize {
        self.observations.read().await.len()
    }

    pub async fn forecast_count(&self) -> usize {
        self.forecasts.read().await.len()
    }

    fn check_writable(&self, table: &str) -> AppResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(AppError::StoreWriteFailure(format!(
                "{}: writes disabled",
                table
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl WeatherStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn append_observation(&self, observation: &WeatherObservation) -> AppResult<()> {
        self.check_writable("weather_data")?;
        self.observations.write().await.push(observation.clone());
        Ok(())
    }

    async fn latest_observations(&self, limit: usize) -> AppResult<Vec<WeatherObservation>> {
        let mut rows = self.observations.read().await.clone();
        // Stable sort keeps insertion order among equal timestamps; reverse puts the latest write first
        rows.sort_by_key(|o| o.timestamp);
        rows.reverse();
        rows.truncate(limit);
        Ok(rows)
    }

    async fn insert_forecasts(&self, rows: &[ForecastRecord]) -> AppResult<u64> {
        self.check_writable("predictions")?;
        self.forecasts.write().await.extend_from_slice(rows);
        Ok(rows.len() as u64)
    }

    async fn recent_forecasts(&self, limit: usize) -> AppResult<Vec<ForecastRecord>> {
        let mut rows = self.forecasts.read().await.clone();
        rows.sort_by_key(|f| (f.prediction_time, f.forecast_time));
        rows.reverse();
        rows.truncate(limit);
        Ok(rows)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
