//! Pipeline integration tests
//!
//! Raw history → cleaner → feature builder → forecaster → publisher, against
//! the in-memory store.

mod common;

use chrono::Duration;
use proptest::prelude::*;
use std::sync::Arc;

use shared::{build_features, clean, OrderedSeries, RiskLevel};
use thundercast::error::AppError;
use thundercast::forecasting::{load_model, SeasonalRegressor, TrainableForecaster, TrainedModel};
use thundercast::services::{PredictionService, TrainingService};
use thundercast::store::{MemoryStore, WeatherStore};

use common::*;

// ============================================================================
// End-to-end scenario
// ============================================================================

#[test]
fn test_ten_hour_scenario() {
    let cleaned = clean(&ten_hour_history());
    let labels: Vec<u8> = cleaned.iter().map(|r| r.thunderstorm as u8).collect();
    assert_eq!(labels, vec![0, 0, 0, 0, 0, 0, 1, 0, 0, 0]);

    let series = OrderedSeries::sort_from(cleaned).unwrap();
    let featured = build_features(&series);
    assert_eq!(featured.len(), 9);
    assert_eq!(featured[0].timestamp, base_time() + Duration::hours(1));

    let forecaster = SeasonalRegressor::new();
    let model = forecaster.train(&featured).unwrap();

    let latest = observation_at(base_time() + Duration::hours(9), 80.0);
    let start = base_time() + Duration::hours(10);
    let points = forecaster.score(&model, &latest, start, 6).unwrap();

    assert_eq!(points.len(), 6);
    assert!(points
        .windows(2)
        .all(|w| w[0].forecast_time < w[1].forecast_time));
    assert!(points
        .iter()
        .all(|p| (0.0..=100.0).contains(&p.probability)));
}

#[tokio::test]
async fn test_train_then_predict_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("history.csv");
    let model_path = dir.path().join("models/seasonal_model.json");
    std::fs::write(&input, history_csv(&ten_hour_history())).unwrap();

    let summary = TrainingService::new(model_path.clone())
        .train_from_csv(&input)
        .unwrap();
    assert_eq!(summary.raw_rows, 10);
    assert_eq!(summary.featured_rows, 9);
    assert_eq!(summary.thunderstorm_cases, 1);
    assert_eq!(summary.regressor_effects.len(), 6);
    assert!(load_model::<TrainedModel>(&model_path).is_ok());

    let store = Arc::new(MemoryStore::new());
    store
        .append_observation(&observation_at(base_time() + Duration::hours(9), 75.0))
        .await
        .unwrap();

    let config = test_config(&model_path);
    let service = PredictionService::new(store.clone(), &config.forecast);
    let now = base_time() + Duration::hours(10);
    let outcome = service.run_cycle_at(now).await.unwrap();

    assert_eq!(outcome.published, 6);
    assert_eq!(outcome.location, "Pimpri-Chinchwad");
    assert_eq!(outcome.points[0].forecast_time, now);

    let stored = store.recent_forecasts(100).await.unwrap();
    assert_eq!(stored.len(), 6);
    assert!(stored.iter().all(|r| r.prediction_time == now));
    assert!(stored.iter().all(|r| r.model_version == "seasonal_v1"));
}

#[test]
fn test_prepare_writes_featured_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("history.csv");
    let output = dir.path().join("processed/featured.csv");
    std::fs::write(&input, history_csv(&ten_hour_history())).unwrap();

    let prepared = TrainingService::new(dir.path().join("model.json"))
        .prepare(&input, &output)
        .unwrap();
    assert_eq!(prepared.report.rows, 10);

    let written = std::fs::read_to_string(&output).unwrap();
    let mut lines = written.lines();
    let header = lines.next().unwrap();
    assert!(header.contains("humidity_lag_1h"));
    assert!(header.contains("season"));
    assert_eq!(lines.count(), 9);
}

// ============================================================================
// Failure paths
// ============================================================================

#[tokio::test]
async fn test_predict_without_observations() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("history.csv");
    let model_path = dir.path().join("model.json");
    std::fs::write(&input, history_csv(&ten_hour_history())).unwrap();
    TrainingService::new(model_path.clone())
        .train_from_csv(&input)
        .unwrap();

    let store = Arc::new(MemoryStore::new());
    let config = test_config(&model_path);
    let err = PredictionService::new(store.clone(), &config.forecast)
        .run_cycle()
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NoObservations));
    assert_eq!(store.forecast_count().await, 0);
}

#[tokio::test]
async fn test_predict_without_model() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    store
        .append_observation(&observation_at(base_time(), 70.0))
        .await
        .unwrap();

    let config = test_config(&dir.path().join("missing.json"));
    let err = PredictionService::new(store.clone(), &config.forecast)
        .run_cycle()
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ModelUnavailable(_)));
    assert_eq!(store.forecast_count().await, 0);
}

#[tokio::test]
async fn test_publish_failure_leaves_store_empty() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("history.csv");
    let model_path = dir.path().join("model.json");
    std::fs::write(&input, history_csv(&ten_hour_history())).unwrap();
    TrainingService::new(model_path.clone())
        .train_from_csv(&input)
        .unwrap();

    let store = Arc::new(MemoryStore::new());
    store
        .append_observation(&observation_at(base_time(), 70.0))
        .await
        .unwrap();
    store.reject_writes(true);

    let config = test_config(&model_path);
    let err = PredictionService::new(store.clone(), &config.forecast)
        .run_cycle()
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StoreWriteFailure(_)));
    assert_eq!(store.forecast_count().await, 0);
}

#[test]
fn test_duplicate_history_timestamps_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("history.csv");
    let mut rows = ten_hour_history();
    rows[3].timestamp = rows[2].timestamp;
    std::fs::write(&input, history_csv(&rows)).unwrap();

    let err = TrainingService::new(dir.path().join("model.json"))
        .train_from_csv(&input)
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidSeries(_)));
}

#[test]
fn test_single_row_history_is_insufficient() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("history.csv");
    std::fs::write(&input, history_csv(&ten_hour_history()[..2])).unwrap();

    let err = TrainingService::new(dir.path().join("model.json"))
        .train_from_csv(&input)
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientHistory(_)));
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Scoring yields one bounded row per horizon step, in time order
    #[test]
    fn prop_score_matches_horizon(horizon in 1u32..=48, humidity in 0.0f64..=100.0) {
        let series = OrderedSeries::sort_from(clean(&ten_hour_history())).unwrap();
        let featured = build_features(&series);
        let forecaster = SeasonalRegressor::new();
        let model = forecaster.train(&featured).unwrap();

        let latest = observation_at(base_time() + Duration::hours(9), humidity);
        let points = forecaster
            .score(&model, &latest, base_time() + Duration::hours(10), horizon)
            .unwrap();

        prop_assert_eq!(points.len(), horizon as usize);
        for (i, point) in points.iter().enumerate() {
            prop_assert_eq!(
                point.forecast_time,
                base_time() + Duration::hours(10 + i as i64)
            );
            prop_assert!((0.0..=100.0).contains(&point.probability));
            let banded = point.risk_level();
            prop_assert_eq!(banded, RiskLevel::from_probability(point.probability));
        }
    }
}
