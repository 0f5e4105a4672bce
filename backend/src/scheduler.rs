//! Periodic collection loop
//!
//! Runs once at start, then once per interval. A run that overlaps the next
//! tick makes that tick late rather than queued, and every fetch is bounded
//! by the configured timeout.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, timeout, MissedTickBehavior};

use shared::WeatherObservation;

use crate::config::SchedulerConfig;
use crate::error::{AppError, AppResult};
use crate::services::IngestorService;

/// One bounded fetch-and-store
pub async fn collect_once(
    ingestor: &IngestorService,
    fetch_timeout: Duration,
) -> AppResult<WeatherObservation> {
    match timeout(fetch_timeout, ingestor.fetch()).await {
        Ok(result) => result,
        Err(_) => Err(AppError::NetworkFailure(format!(
            "fetch abandoned after {}s",
            fetch_timeout.as_secs_f64()
        ))),
    }
}

/// Collect until `shutdown` flips to true or its sender is dropped
pub async fn run_collection_loop(
    ingestor: IngestorService,
    schedule: SchedulerConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(schedule.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        interval_secs = schedule.poll_interval_secs,
        location = %ingestor.location().city,
        "Collection scheduler started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match collect_once(&ingestor, schedule.fetch_timeout()).await {
                    Ok(observation) => tracing::debug!(id = %observation.id, "Collection tick done"),
                    Err(e) => tracing::warn!(error = %e, code = e.code(), "Collection tick failed"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("Collection scheduler stopped");
}
