//! Route definitions for the ThunderCast dashboard API

use axum::{routing::get, Router};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Observations collected by the ingestor
        .route("/observations", get(handlers::observation_history))
        .route("/observations/latest", get(handlers::latest_observation))
        // Published forecasts
        .route("/forecasts", get(handlers::forecasts))
}
