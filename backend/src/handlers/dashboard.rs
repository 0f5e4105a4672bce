//! HTTP handlers for the dashboard read API
//!
//! "No data yet" answers 200 with `status: "empty"`; failures go through
//! `AppError` and answer an error status.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::services::dashboard::{DashboardService, ForecastBoard, ObservationHistory, ObservationView};
use crate::AppState;

pub const DEFAULT_HISTORY_LIMIT: usize = 24;
pub const DEFAULT_FORECAST_LIMIT: usize = 24;
pub const MAX_LIMIT: usize = 1000;

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DashboardPayload<T> {
    Ok { data: T },
    Empty { message: String },
}

impl<T> DashboardPayload<T> {
    fn from_option(value: Option<T>, empty_message: &str) -> Self {
        match value {
            Some(data) => Self::Ok { data },
            None => Self::Empty {
                message: empty_message.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    fn resolve(&self, default: usize) -> AppResult<usize> {
        let limit = self.limit.unwrap_or(default);
        if limit == 0 || limit > MAX_LIMIT {
            return Err(AppError::Validation {
                field: "limit".to_string(),
                message: format!("limit must be between 1 and {}", MAX_LIMIT),
            });
        }
        Ok(limit)
    }
}

/// Latest stored observation
pub async fn latest_observation(
    State(state): State<AppState>,
) -> AppResult<Json<DashboardPayload<ObservationView>>> {
    let service = DashboardService::new(state.store);
    let latest = service.latest_observation().await?;
    Ok(Json(DashboardPayload::from_option(
        latest,
        "No weather data yet. Run the collector first.",
    )))
}

/// Observation history, oldest first, with statistics
pub async fn observation_history(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<DashboardPayload<ObservationHistory>>> {
    let limit = query.resolve(DEFAULT_HISTORY_LIMIT)?;
    let service = DashboardService::new(state.store);
    let history = service.observation_history(limit).await?;
    Ok(Json(DashboardPayload::from_option(
        history,
        "No historical data available for the selected range.",
    )))
}

/// Recent forecasts with risk levels and a summary
pub async fn forecasts(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<DashboardPayload<ForecastBoard>>> {
    let limit = query.resolve(DEFAULT_FORECAST_LIMIT)?;
    let service = DashboardService::new(state.store);
    let board = service.forecast_board(limit).await?;
    Ok(Json(DashboardPayload::from_option(
        board,
        "No predictions yet. Run `thundercast predict` first.",
    )))
}
