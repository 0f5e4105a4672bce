//! Offline training: raw history CSV → cleaned → featured → fitted model

use serde::Serialize;
use std::path::{Path, PathBuf};

use shared::{build_features, clean, CleaningReport, FeaturedRecord, OrderedSeries};

use crate::error::AppResult;
use crate::forecasting::{save_model, ModelArtifact, SeasonalRegressor, TrainableForecaster};
use crate::store::history::{read_raw_history, write_featured_file};

/// Cleaned and featured history, ready for fitting
#[derive(Debug, Clone)]
pub struct PreparedHistory {
    pub report: CleaningReport,
    pub featured: Vec<FeaturedRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    pub raw_rows: usize,
    pub featured_rows: usize,
    pub thunderstorm_cases: usize,
    pub model_path: PathBuf,
    pub regressor_effects: Vec<(String, f64)>,
}

pub struct TrainingService<F: TrainableForecaster = SeasonalRegressor> {
    forecaster: F,
    model_path: PathBuf,
}

impl TrainingService<SeasonalRegressor> {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self::with_forecaster(model_path, SeasonalRegressor::default())
    }
}

impl<F: TrainableForecaster> TrainingService<F> {
    pub fn with_forecaster(model_path: impl Into<PathBuf>, forecaster: F) -> Self {
        Self {
            forecaster,
            model_path: model_path.into(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Clean, order and feature a raw history file
    pub fn prepare_history(&self, input: &Path) -> AppResult<PreparedHistory> {
        let raw = read_raw_history(input)?;
        let cleaned = clean(&raw);

        let report = CleaningReport::from_records(&cleaned);
        log_cleaning_report(&report);

        let series = OrderedSeries::sort_from(cleaned)?;
        let featured = build_features(&series);
        tracing::info!(
            raw_rows = report.rows,
            featured_rows = featured.len(),
            dropped = report.rows - featured.len(),
            "Built features"
        );

        Ok(PreparedHistory { report, featured })
    }

    /// Write the featured history to `output` for inspection
    pub fn prepare(&self, input: &Path, output: &Path) -> AppResult<PreparedHistory> {
        let prepared = self.prepare_history(input)?;
        write_featured_file(output, &prepared.featured)?;
        tracing::info!(path = %output.display(), "Wrote featured history");
        Ok(prepared)
    }

    /// Fit on a raw history file and persist the model artifact
    pub fn train_from_csv(&self, input: &Path) -> AppResult<TrainingSummary> {
        let prepared = self.prepare_history(input)?;
        let model = self.forecaster.train(&prepared.featured)?;
        save_model(&self.model_path, &model)?;

        let regressor_effects = model.regressor_effects();
        for (regressor, effect) in &regressor_effects {
            tracing::info!(regressor = %regressor, effect, "Regressor effect per unit");
        }

        tracing::info!(
            forecaster = self.forecaster.name(),
            path = %self.model_path.display(),
            "Saved model"
        );

        Ok(TrainingSummary {
            raw_rows: prepared.report.rows,
            featured_rows: prepared.featured.len(),
            thunderstorm_cases: prepared.report.thunderstorm_cases,
            model_path: self.model_path.clone(),
            regressor_effects,
        })
    }
}

fn log_cleaning_report(report: &CleaningReport) {
    tracing::info!(
        rows = report.rows,
        thunderstorm_cases = report.thunderstorm_cases,
        thunderstorm_percent = report.thunderstorm_percent,
        missing = report.total_missing(),
        "Cleaned history"
    );
    for column in &report.columns {
        tracing::debug!(
            column = column.column,
            count = column.count,
            missing = column.missing,
            mean = ?column.mean,
            std = ?column.std,
            min = ?column.min,
            max = ?column.max,
            "Column summary"
        );
    }
}
