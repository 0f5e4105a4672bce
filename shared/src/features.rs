//! Feature engineering over an ordered cleaned series
//!
//! Every feature is causal: row `i` only looks at rows `0..=i`. Rolling
//! statistics use a minimum period of one and skip missing values inside
//! their window. Rows with any undefined feature are dropped at the end, which
//! always removes the first row (its lag is undefined). Nothing is imputed.

use chrono::{Datelike, Timelike};
use std::f64::consts::PI;

use crate::cleaning::sample_std;
use crate::models::{CleanedRecord, FeaturedRecord, Season};
use crate::series::OrderedSeries;

pub const TEMP_ROLLING_WINDOW: usize = 3;
pub const HUMIDITY_ROLLING_WINDOW: usize = 3;
pub const PRESSURE_ROLLING_WINDOW: usize = 6;
pub const TEMP_STD_WINDOW: usize = 3;

pub const HOURS_PER_DAY: f64 = 24.0;
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Build the featured series. Pure and deterministic.
pub fn build_features(series: &OrderedSeries<CleanedRecord>) -> Vec<FeaturedRecord> {
    let rows = series.rows();
    let temperature: Vec<_> = rows.iter().map(|r| r.temperature).collect();
    let humidity: Vec<_> = rows.iter().map(|r| r.humidity).collect();
    let pressure: Vec<_> = rows.iter().map(|r| r.pressure).collect();

    let columns = DerivedColumns {
        temp_lag: lag(&temperature, 1),
        humidity_lag: lag(&humidity, 1),
        pressure_lag: lag(&pressure, 1),
        temp_rolling: rolling_mean(&temperature, TEMP_ROLLING_WINDOW),
        humidity_rolling: rolling_mean(&humidity, HUMIDITY_ROLLING_WINDOW),
        pressure_rolling: rolling_mean(&pressure, PRESSURE_ROLLING_WINDOW),
        temp_std: rolling_std(&temperature, TEMP_STD_WINDOW),
    };

    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| assemble(row, i, &columns))
        .collect()
}

struct DerivedColumns {
    temp_lag: Vec<Option<f64>>,
    humidity_lag: Vec<Option<f64>>,
    pressure_lag: Vec<Option<f64>>,
    temp_rolling: Vec<Option<f64>>,
    humidity_rolling: Vec<Option<f64>>,
    pressure_rolling: Vec<Option<f64>>,
    temp_std: Vec<Option<f64>>,
}

fn assemble(row: &CleanedRecord, i: usize, columns: &DerivedColumns) -> Option<FeaturedRecord> {
    let temperature = row.temperature?;
    let humidity = row.humidity?;
    let pressure = row.pressure?;
    let wind_speed_kmph = row.wind_speed_kmph?;
    let cloud_cover = row.cloud_cover?;
    let precipitation = row.precipitation?;

    let temp_lag_1h = columns.temp_lag[i]?;
    let humidity_lag_1h = columns.humidity_lag[i]?;
    let pressure_lag_1h = columns.pressure_lag[i]?;

    let humidity_pressure_ratio = if pressure == 0.0 {
        return None;
    } else {
        humidity / pressure
    };

    let ts = row.timestamp;
    let hour = ts.hour();
    let month = ts.month();
    let (hour_sin, hour_cos) = cyclical_encode(f64::from(hour), HOURS_PER_DAY);
    let (month_sin, month_cos) = cyclical_encode(f64::from(month), MONTHS_PER_YEAR);

    Some(FeaturedRecord {
        timestamp: ts,
        temperature,
        humidity,
        pressure,
        wind_speed_kmph,
        cloud_cover,
        precipitation,
        thunderstorm: row.thunderstorm,
        year: ts.year(),
        month,
        day: ts.day(),
        hour,
        day_of_week: ts.weekday().num_days_from_monday(),
        day_of_year: ts.ordinal(),
        season: Season::from_month(month),
        temp_humidity: temperature * humidity,
        pressure_wind: pressure * wind_speed_kmph,
        humidity_pressure_ratio,
        temp_lag_1h,
        humidity_lag_1h,
        pressure_lag_1h,
        temp_change: temperature - temp_lag_1h,
        pressure_change: pressure - pressure_lag_1h,
        temp_rolling_3h: columns.temp_rolling[i]?,
        humidity_rolling_3h: columns.humidity_rolling[i]?,
        pressure_rolling_6h: columns.pressure_rolling[i]?,
        temp_rolling_std_3h: columns.temp_std[i]?,
        hour_sin,
        hour_cos,
        month_sin,
        month_cos,
    })
}

/// Encode a periodic value as a point on the unit circle
pub fn cyclical_encode(value: f64, period: f64) -> (f64, f64) {
    let angle = 2.0 * PI * value / period;
    (angle.sin(), angle.cos())
}

/// Recover the periodic value from its encoding, in `[0, period)`
pub fn cyclical_decode(sin: f64, cos: f64, period: f64) -> f64 {
    let angle = sin.atan2(cos).rem_euclid(2.0 * PI);
    angle * period / (2.0 * PI)
}

/// Value from `periods` rows earlier
pub fn lag(values: &[Option<f64>], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| i.checked_sub(periods).and_then(|j| values[j]))
        .collect()
}

/// Causal rolling mean over the last `window` rows, min-period one
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |present| {
        if present.is_empty() {
            None
        } else {
            Some(present.iter().sum::<f64>() / present.len() as f64)
        }
    })
}

/// Causal rolling sample standard deviation. Undefined below two values.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, sample_std)
}

fn rolling<F>(values: &[Option<f64>], window: usize, stat: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let window = window.max(1);
    let mut present = Vec::with_capacity(window);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            present.clear();
            present.extend(values[start..=i].iter().flatten().copied());
            stat(&present)
        })
        .collect()
}
