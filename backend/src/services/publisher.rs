//! Publisher: batch-write forecast rows

use std::sync::Arc;

use shared::ForecastRecord;

use crate::error::AppResult;
use crate::store::WeatherStore;

#[derive(Clone)]
pub struct PublisherService {
    store: Arc<dyn WeatherStore>,
}

impl PublisherService {
    pub fn new(store: Arc<dyn WeatherStore>) -> Self {
        Self { store }
    }

    /// Write the whole batch or nothing. An empty batch is a successful no-op.
    pub async fn publish(&self, rows: &[ForecastRecord]) -> AppResult<u64> {
        if rows.is_empty() {
            tracing::debug!("Nothing to publish");
            return Ok(0);
        }

        let written = self.store.insert_forecasts(rows).await?;
        tracing::info!(rows = written, "Published forecasts");
        Ok(written)
    }
}
