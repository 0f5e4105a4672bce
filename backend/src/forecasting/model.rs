//! Trained model artifact
//!
//! Stored as JSON. The artifact carries a fingerprint of the regressor list
//! it was fitted on; loading it under a different list fails, which forces a
//! retrain whenever the feature schema changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::f64::consts::PI;
use std::path::Path;

use super::{ModelArtifact, RegressorRow, REGRESSOR_NAMES};
use crate::error::{AppError, AppResult};

/// Bumped whenever the design-matrix layout changes
pub const MODEL_SCHEMA_VERSION: u32 = 1;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// One Fourier seasonality
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonBlock {
    pub name: String,
    pub period_days: f64,
    pub order: usize,
}

impl SeasonBlock {
    pub fn new(name: &str, period_days: f64, order: usize) -> Self {
        Self {
            name: name.to_string(),
            period_days,
            order,
        }
    }
}

/// Standardization applied to one regressor before fitting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressorScale {
    pub name: String,
    pub mean: f64,
    pub std: f64,
}

/// Fitted seasonal additive regressor
///
/// Coefficient layout: offset, base growth rate, one rate adjustment per
/// changepoint, `sin`/`cos` pairs per seasonality order, then one per
/// regressor. All coefficients are on the scaled target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainedModel {
    pub schema_version: u32,
    pub regressor_fingerprint: String,
    pub trained_at: DateTime<Utc>,
    pub training_rows: usize,
    /// First training timestamp; trend time is measured from here
    pub t0: DateTime<Utc>,
    /// Seconds spanned by the training history
    pub t_scale_secs: f64,
    pub y_scale: f64,
    /// Changepoint locations in scaled trend time
    pub changepoints: Vec<f64>,
    pub seasonalities: Vec<SeasonBlock>,
    pub regressors: Vec<RegressorScale>,
    pub coefficients: Vec<f64>,
    /// Residual standard deviation on the scaled target
    pub sigma_obs: f64,
    pub interval_width: f64,
}

/// SHA-256 over the schema version and the ordered regressor names
pub fn regressor_fingerprint() -> String {
    let mut hasher = Sha256::new();
    hasher.update(MODEL_SCHEMA_VERSION.to_le_bytes());
    for name in REGRESSOR_NAMES {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

impl TrainedModel {
    /// Width of one design-matrix row
    pub fn column_count(&self) -> usize {
        2 + self.changepoints.len()
            + self.seasonalities.iter().map(|s| 2 * s.order).sum::<usize>()
            + self.regressors.len()
    }

    pub(crate) fn scaled_time(&self, at: DateTime<Utc>) -> f64 {
        let elapsed = (at - self.t0).num_milliseconds() as f64 / 1000.0;
        elapsed / self.t_scale_secs
    }

    /// Design-matrix row for one instant and its raw regressor values
    pub(crate) fn design_row(&self, at: DateTime<Utc>, regressors: &RegressorRow) -> Vec<f64> {
        let t = self.scaled_time(at);
        let mut row = Vec::with_capacity(self.column_count());

        row.push(1.0);
        row.push(t);
        row.extend(self.changepoints.iter().map(|&s| (t - s).max(0.0)));

        // Seasonal terms run on absolute days so phase does not depend on t0
        let days = at.timestamp() as f64 / SECONDS_PER_DAY;
        for block in &self.seasonalities {
            for k in 1..=block.order {
                let x = 2.0 * PI * k as f64 * days / block.period_days;
                row.push(x.sin());
                row.push(x.cos());
            }
        }

        row.extend(
            self.regressors
                .iter()
                .zip(regressors.iter())
                .map(|(scale, &value)| (value - scale.mean) / scale.std),
        );
        row
    }

    /// Point prediction and interval bounds, in target units
    pub fn predict(&self, at: DateTime<Utc>, regressors: &RegressorRow) -> (f64, f64, f64) {
        let scaled: f64 = self
            .design_row(at, regressors)
            .iter()
            .zip(&self.coefficients)
            .map(|(x, beta)| x * beta)
            .sum();
        let half_width = normal_quantile(0.5 + self.interval_width / 2.0) * self.sigma_obs;

        (
            scaled * self.y_scale,
            (scaled - half_width) * self.y_scale,
            (scaled + half_width) * self.y_scale,
        )
    }

    /// Effect of one raw unit of each regressor on the target
    pub fn regressor_coefficients(&self) -> Vec<(&str, f64)> {
        let offset = self.coefficients.len().saturating_sub(self.regressors.len());
        self.regressors
            .iter()
            .zip(&self.coefficients[offset..])
            .map(|(scale, beta)| (scale.name.as_str(), beta * self.y_scale / scale.std))
            .collect()
    }
}

impl ModelArtifact for TrainedModel {
    fn check_schema(&self) -> AppResult<()> {
        let expected = regressor_fingerprint();
        if self.schema_version != MODEL_SCHEMA_VERSION || self.regressor_fingerprint != expected {
            return Err(AppError::ModelSchemaMismatch {
                expected,
                found: self.regressor_fingerprint.clone(),
            });
        }
        if self.coefficients.len() != self.column_count() {
            return Err(AppError::ModelUnavailable(format!(
                "model has {} coefficients, layout needs {}",
                self.coefficients.len(),
                self.column_count()
            )));
        }
        if !(self.t_scale_secs > 0.0 && self.y_scale > 0.0) {
            return Err(AppError::ModelUnavailable("model scaling is degenerate".into()));
        }
        Ok(())
    }

    fn regressor_effects(&self) -> Vec<(String, f64)> {
        self.regressor_coefficients()
            .into_iter()
            .map(|(name, effect)| (name.to_string(), effect))
            .collect()
    }
}

/// Write a model artifact as pretty JSON, creating parent directories
pub fn save_model<M: ModelArtifact>(path: &Path, model: &M) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(model)
        .map_err(|e| AppError::Internal(format!("Failed to serialize model: {}", e)))?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a model artifact and check it against the running schema
pub fn load_model<M: ModelArtifact>(path: &Path) -> AppResult<M> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::ModelUnavailable(format!(
                "no model at {}; run `thundercast train` first",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let model: M = serde_json::from_slice(&bytes).map_err(|e| {
        AppError::ModelUnavailable(format!("unreadable model at {}: {}", path.display(), e))
    })?;
    model.check_schema()?;
    Ok(model)
}

/// Inverse of the standard normal CDF
///
/// Acklam's rational approximation. The central region is accurate to about
/// 1e-9; the tails get one Halley step against `erfc`.
pub fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549671664286631e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    // Lower tail only; the upper tail goes through symmetry
    let refined_tail = |p: f64| {
        let x = tail((-2.0 * p.ln()).sqrt());
        let e = 0.5 * erfc(-x / std::f64::consts::SQRT_2) - p;
        let u = e * (2.0 * std::f64::consts::PI).sqrt() * (x * x / 2.0).exp();
        if u.is_finite() {
            x - u / (1.0 + x * u / 2.0)
        } else {
            x
        }
    };

    if p < P_LOW {
        refined_tail(p)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -refined_tail(1.0 - p)
    }
}

/// Complementary error function, fractional error below 1.2e-7
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let value = t * (-z * z + poly).exp();
    if x >= 0.0 {
        value
    } else {
        2.0 - value
    }
}
