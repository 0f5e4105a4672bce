//! Seasonal additive regressor
//!
//! Piecewise-linear trend with changepoints, Fourier seasonality and
//! standardized external regressors, fitted by MAP estimation under Gaussian
//! priors. With Gaussian priors the MAP fit is a ridge regression with one
//! penalty per column, solved here through the normal equations.

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use std::collections::BTreeSet;

use shared::{clamp_probability, FeaturedRecord, ForecastPoint, WeatherObservation};

use super::model::{regressor_fingerprint, RegressorScale, SeasonBlock, TrainedModel};
use super::{
    future_frame, regressor_row, ModelArtifact, RegressorRow, TrainableForecaster,
    REGRESSOR_NAMES,
};
use crate::error::{AppError, AppResult};

const MIN_NOISE_VARIANCE: f64 = 1e-6;
const INITIAL_NOISE_FLOOR: f64 = 1e-4;
const CHOLESKY_JITTER: f64 = 1e-9;

/// Model configuration. Defaults follow the usual Prophet settings.
#[derive(Debug, Clone)]
pub struct SeasonalRegressor {
    n_changepoints: usize,
    changepoint_range: f64,
    changepoint_prior_scale: f64,
    trend_prior_scale: f64,
    seasonality_prior_scale: f64,
    regressor_prior_scale: f64,
    interval_width: f64,
    seasonalities: Vec<SeasonBlock>,
}

impl Default for SeasonalRegressor {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            trend_prior_scale: 5.0,
            seasonality_prior_scale: 10.0,
            regressor_prior_scale: 10.0,
            interval_width: 0.95,
            seasonalities: vec![
                SeasonBlock::new("daily", 1.0, 4),
                SeasonBlock::new("weekly", 7.0, 3),
                SeasonBlock::new("yearly", 365.25, 10),
            ],
        }
    }
}

impl SeasonalRegressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-column prior scales in design-matrix order
    fn prior_scales(&self, model: &TrainedModel) -> Vec<f64> {
        let mut scales = vec![self.trend_prior_scale; 2];
        scales.extend(std::iter::repeat(self.changepoint_prior_scale).take(model.changepoints.len()));
        let seasonal_columns: usize = model.seasonalities.iter().map(|s| 2 * s.order).sum();
        scales.extend(std::iter::repeat(self.seasonality_prior_scale).take(seasonal_columns));
        scales.extend(std::iter::repeat(self.regressor_prior_scale).take(model.regressors.len()));
        scales
    }

    /// Evenly spaced changepoints over the first `changepoint_range` of history
    fn select_changepoints(&self, scaled_times: &[f64]) -> Vec<f64> {
        let hist_size = (scaled_times.len() as f64 * self.changepoint_range).floor() as usize;
        let count = self.n_changepoints.min(hist_size.saturating_sub(1));
        if count == 0 {
            return Vec::new();
        }

        let last = (hist_size - 1) as f64;
        (1..=count)
            .map(|i| {
                let index = (i as f64 * last / count as f64).round() as usize;
                scaled_times[index]
            })
            .collect()
    }
}

impl TrainableForecaster for SeasonalRegressor {
    type Model = TrainedModel;

    fn name(&self) -> &'static str {
        "seasonal"
    }

    fn train(&self, series: &[FeaturedRecord]) -> AppResult<TrainedModel> {
        if series.is_empty() {
            return Err(AppError::InsufficientHistory("no featured rows".into()));
        }

        for (column, name) in REGRESSOR_NAMES.iter().enumerate() {
            if !series.iter().any(|r| regressor_row(r)[column].is_finite()) {
                return Err(AppError::InsufficientHistory(format!(
                    "regressor '{}' has no finite values",
                    name
                )));
            }
        }

        let mut usable: Vec<(DateTime<Utc>, RegressorRow, f64)> = series
            .iter()
            .map(|r| (r.timestamp, regressor_row(r), r.target()))
            .filter(|(_, row, _)| row.iter().all(|v| v.is_finite()))
            .collect();
        usable.sort_by_key(|(ts, _, _)| *ts);
        if usable.len() < series.len() {
            tracing::debug!(
                dropped = series.len() - usable.len(),
                "Skipping rows with non-finite regressors"
            );
        }

        let distinct: BTreeSet<DateTime<Utc>> = usable.iter().map(|(ts, _, _)| *ts).collect();
        if distinct.len() < 2 {
            return Err(AppError::InsufficientHistory(format!(
                "need at least 2 distinct timestamps, found {}",
                distinct.len()
            )));
        }

        let n = usable.len();
        let t0 = usable[0].0;
        let t_end = usable[n - 1].0;
        let t_scale_secs = (t_end - t0).num_milliseconds() as f64 / 1000.0;

        let regressors = REGRESSOR_NAMES
            .iter()
            .enumerate()
            .map(|(column, name)| {
                let values: Vec<f64> = usable.iter().map(|(_, row, _)| row[column]).collect();
                let (mean, std) = mean_and_std(&values);
                RegressorScale {
                    name: name.to_string(),
                    mean,
                    std,
                }
            })
            .collect();

        let y_scale = usable
            .iter()
            .map(|(_, _, y)| y.abs())
            .fold(0.0, f64::max);
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let mut model = TrainedModel {
            schema_version: super::MODEL_SCHEMA_VERSION,
            regressor_fingerprint: regressor_fingerprint(),
            trained_at: Utc::now(),
            training_rows: n,
            t0,
            t_scale_secs,
            y_scale,
            changepoints: Vec::new(),
            seasonalities: self.seasonalities.clone(),
            regressors,
            coefficients: Vec::new(),
            sigma_obs: 0.0,
            interval_width: self.interval_width,
        };

        let scaled_times: Vec<f64> = usable.iter().map(|(ts, _, _)| model.scaled_time(*ts)).collect();
        model.changepoints = self.select_changepoints(&scaled_times);

        let p = model.column_count();
        let flat: Vec<f64> = usable
            .iter()
            .flat_map(|(ts, row, _)| model.design_row(*ts, row))
            .collect();
        let x = Array2::from_shape_vec((n, p), flat)
            .map_err(|e| AppError::Internal(format!("design matrix: {}", e)))?;
        let y = Array1::from_iter(usable.iter().map(|(_, _, y)| y / y_scale));
        let priors = self.prior_scales(&model);

        // Pass one uses the target variance as the noise scale, pass two the residual variance
        let initial_noise = y.var(0.0).max(INITIAL_NOISE_FLOOR);
        let theta = ridge_solve(&x, &y, &priors, initial_noise)?;
        let noise = residual_variance(&x, &y, &theta).max(MIN_NOISE_VARIANCE);
        let theta = ridge_solve(&x, &y, &priors, noise)?;

        if theta.iter().any(|v| !v.is_finite()) {
            return Err(AppError::Internal("fit produced non-finite coefficients".into()));
        }

        model.sigma_obs = residual_variance(&x, &y, &theta)
            .max(MIN_NOISE_VARIANCE)
            .sqrt();
        model.coefficients = theta.to_vec();

        tracing::info!(
            rows = n,
            changepoints = model.changepoints.len(),
            columns = p,
            sigma = model.sigma_obs,
            "Trained seasonal regressor"
        );

        Ok(model)
    }

    fn score(
        &self,
        model: &TrainedModel,
        latest: &WeatherObservation,
        start: DateTime<Utc>,
        horizon_hours: u32,
    ) -> AppResult<Vec<ForecastPoint>> {
        model.check_schema()?;

        future_frame(latest, start, horizon_hours)
            .into_iter()
            .map(|(forecast_time, row)| {
                let (yhat, lower, upper) = model.predict(forecast_time, &row);
                let probability = clamp_probability(yhat * 100.0).ok_or_else(|| {
                    AppError::Internal(format!("non-finite prediction for {}", forecast_time))
                })?;

                Ok(ForecastPoint {
                    forecast_time,
                    probability,
                    lower_bound: clamp_probability(lower * 100.0).unwrap_or(0.0),
                    upper_bound: clamp_probability(upper * 100.0).unwrap_or(100.0),
                })
            })
            .collect()
    }
}

/// Sample mean and standard deviation; a zero or undefined spread becomes 1
fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 1.0);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = var.sqrt();
    if std.is_finite() && std > 1e-12 {
        (mean, std)
    } else {
        (mean, 1.0)
    }
}

fn residual_variance(x: &Array2<f64>, y: &Array1<f64>, theta: &Array1<f64>) -> f64 {
    let residuals = y - &x.dot(theta);
    residuals.mapv(|r| r * r).mean().unwrap_or(0.0)
}

/// Solve `(XᵀX + Λ) θ = Xᵀy` with `Λ_jj = noise / prior_j²`
fn ridge_solve(
    x: &Array2<f64>,
    y: &Array1<f64>,
    priors: &[f64],
    noise: f64,
) -> AppResult<Array1<f64>> {
    let mut normal = x.t().dot(x);
    for (j, prior) in priors.iter().enumerate() {
        normal[[j, j]] += noise / (prior * prior) + CHOLESKY_JITTER;
    }
    let rhs = x.t().dot(y);

    cholesky_solve(&normal, &rhs).ok_or_else(|| {
        AppError::Internal("normal equations are not positive definite".into())
    })
}

/// Solve `A x = b` for symmetric positive-definite `A`
pub(crate) fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if !(sum > 0.0 && sum.is_finite()) {
                    return None;
                }
                l[[i, i]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }

    // L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * z[k];
        }
        z[i] = sum / l[[i, i]];
    }

    // Lᵀ x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use ndarray::array;
    use shared::{build_features, clean, Location, OrderedSeries, RawHistoryRow, Readings};

    fn featured(rows: Vec<RawHistoryRow>) -> Vec<FeaturedRecord> {
        let cleaned = clean(&rows);
        let series = OrderedSeries::sort_from(cleaned).unwrap();
        build_features(&series)
    }

    /// Storms whenever humidity is high; precipitation also occurs on dry hours
    fn humid_storm_history(hours: i64) -> Vec<RawHistoryRow> {
        let start = Utc.with_ymd_and_hms(2023, 7, 1, 0, 0, 0).unwrap();
        (0..hours)
            .map(|i| {
                let humid = (i * 7) % 11 > 5;
                RawHistoryRow {
                    timestamp: start + Duration::hours(i),
                    temperature: Some(25.0 + (i % 5) as f64),
                    humidity: Some(if humid { 90.0 } else { 60.0 }),
                    pressure: Some(1005.0 + (i % 3) as f64),
                    wind_speed_kmph: Some(10.0 + (i % 4) as f64),
                    cloud_cover: Some(if humid { 95.0 } else { 40.0 }),
                    precipitation: Some(if humid || i % 3 == 0 { 6.0 } else { 0.0 }),
                }
            })
            .collect()
    }

    fn observation(humidity: f64) -> WeatherObservation {
        WeatherObservation::new(
            Utc.with_ymd_and_hms(2023, 7, 10, 0, 0, 0).unwrap(),
            Readings {
                temperature: 27.0,
                humidity,
                pressure: 1006.0,
                wind_speed: 3.0,
                cloud_cover: if humidity > 70.0 { 95.0 } else { 40.0 },
            },
            &Location::new("Pune", 18.5, 73.8),
        )
    }

    #[test]
    fn test_cholesky_solve() {
        let a = array![[4.0, 12.0, -16.0], [12.0, 37.0, -43.0], [-16.0, -43.0, 98.0]];
        let b = array![1.0, 2.0, 3.0];
        let x = cholesky_solve(&a, &b).unwrap();
        let back = a.dot(&x);
        for i in 0..3 {
            assert!((back[i] - b[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_cholesky_rejects_indefinite() {
        let a = array![[1.0, 2.0], [2.0, 1.0]];
        assert!(cholesky_solve(&a, &array![1.0, 1.0]).is_none());
    }

    #[test]
    fn test_changepoints_within_range() {
        let forecaster = SeasonalRegressor::new();
        let times: Vec<f64> = (0..100).map(|i| i as f64 / 99.0).collect();
        let changepoints = forecaster.select_changepoints(&times);
        assert_eq!(changepoints.len(), 25);
        assert!(changepoints.iter().all(|&c| c > 0.0 && c <= 0.8));
        assert!(changepoints.windows(2).all(|w| w[0] < w[1]));

        let few: Vec<f64> = (0..9).map(|i| i as f64 / 8.0).collect();
        assert_eq!(forecaster.select_changepoints(&few).len(), 6);
    }

    #[test]
    fn test_learns_humidity_signal() {
        let forecaster = SeasonalRegressor::new();
        let model = forecaster.train(&featured(humid_storm_history(240))).unwrap();

        let humidity = model
            .regressor_coefficients()
            .into_iter()
            .find(|(name, _)| *name == "humidity")
            .unwrap();
        assert!(humidity.1 > 0.0);

        let start = Utc.with_ymd_and_hms(2023, 7, 11, 6, 0, 0).unwrap();
        let wet = forecaster.score(&model, &observation(90.0), start, 1).unwrap();
        let dry = forecaster.score(&model, &observation(60.0), start, 1).unwrap();
        assert!(wet[0].probability > dry[0].probability);
    }

    #[test]
    fn test_score_shape_and_bounds() {
        let forecaster = SeasonalRegressor::new();
        let model = forecaster.train(&featured(humid_storm_history(72))).unwrap();
        let start = Utc.with_ymd_and_hms(2023, 7, 4, 1, 0, 0).unwrap();

        let points = forecaster.score(&model, &observation(85.0), start, 12).unwrap();
        assert_eq!(points.len(), 12);
        assert!(points.windows(2).all(|w| w[0].forecast_time < w[1].forecast_time));
        for point in &points {
            assert!((0.0..=100.0).contains(&point.probability));
            assert!(point.lower_bound <= point.probability);
            assert!(point.probability <= point.upper_bound);
        }
    }

    #[test]
    fn test_training_is_deterministic() {
        let forecaster = SeasonalRegressor::new();
        let series = featured(humid_storm_history(48));
        let a = forecaster.train(&series).unwrap();
        let b = forecaster.train(&series).unwrap();
        assert_eq!(a.coefficients, b.coefficients);
        assert_eq!(a.changepoints, b.changepoints);
    }

    #[test]
    fn test_single_timestamp_is_insufficient() {
        let mut series = featured(humid_storm_history(3));
        series.truncate(1);
        let err = SeasonalRegressor::new().train(&series).unwrap_err();
        assert!(matches!(err, AppError::InsufficientHistory(_)));

        let err = SeasonalRegressor::new().train(&[]).unwrap_err();
        assert!(matches!(err, AppError::InsufficientHistory(_)));
    }

    #[test]
    fn test_regressor_without_finite_values_is_insufficient() {
        let mut series = featured(humid_storm_history(10));
        for row in &mut series {
            row.cloud_cover = f64::NAN;
        }
        let err = SeasonalRegressor::new().train(&series).unwrap_err();
        assert!(matches!(err, AppError::InsufficientHistory(msg) if msg.contains("cloud_cover")));
    }

    #[test]
    fn test_non_finite_model_aborts_scoring() {
        let forecaster = SeasonalRegressor::new();
        let mut model = forecaster.train(&featured(humid_storm_history(24))).unwrap();
        model.coefficients[0] = f64::NAN;
        let err = forecaster
            .score(&model, &observation(80.0), Utc::now(), 3)
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
