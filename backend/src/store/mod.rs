//! Persistence for observations and forecasts
//!
//! Two append-only logical tables. Reads are always "most recent first" with a
//! row limit, which is all the dashboard and the prediction cycle need.

use async_trait::async_trait;

use shared::{ForecastRecord, WeatherObservation};

use crate::error::AppResult;

pub mod history;
pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgWeatherStore;

#[async_trait]
pub trait WeatherStore: Send + Sync {
    /// Short name used in logs and the health endpoint
    fn backend_tag(&self) -> &'static str;

    /// Append one observation. Fails with `StoreWriteFailure` on rejection.
    async fn append_observation(&self, observation: &WeatherObservation) -> AppResult<()>;

    /// Up to `limit` observations, newest first
    async fn latest_observations(&self, limit: usize) -> AppResult<Vec<WeatherObservation>>;

    /// Insert a batch of forecasts atomically; returns the number of rows written.
    /// Fails with `StoreWriteFailure` and writes nothing on rejection.
    async fn insert_forecasts(&self, rows: &[ForecastRecord]) -> AppResult<u64>;

    /// Up to `limit` forecasts, most recently scored first
    async fn recent_forecasts(&self, limit: usize) -> AppResult<Vec<ForecastRecord>>;

    /// Connectivity check
    async fn ping(&self) -> AppResult<()>;

    /// The newest observation, if any
    async fn latest_observation(&self) -> AppResult<Option<WeatherObservation>> {
        Ok(self.latest_observations(1).await?.into_iter().next())
    }
}
