//! Cleaning of historical rows and the thunderstorm label

use serde::Serialize;

use crate::models::{CleanedRecord, RawHistoryRow};

/// Precipitation must exceed this many millimetres
pub const STORM_PRECIPITATION_MM: f64 = 5.0;
/// Relative humidity must exceed this percentage
pub const STORM_HUMIDITY_PERCENT: f64 = 70.0;
/// Pressure must be below this many hectopascal
pub const STORM_PRESSURE_HPA: f64 = 1010.0;

/// Thunderstorm label: all three thresholds must hold. A missing input fails
/// its comparison.
pub fn thunderstorm_label(
    precipitation: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
) -> bool {
    precipitation.is_some_and(|p| p > STORM_PRECIPITATION_MM)
        && humidity.is_some_and(|h| h > STORM_HUMIDITY_PERCENT)
        && pressure.is_some_and(|p| p < STORM_PRESSURE_HPA)
}

/// Project raw rows onto the model's columns and derive the label.
/// Order is preserved and nothing is dropped or imputed.
pub fn clean(rows: &[RawHistoryRow]) -> Vec<CleanedRecord> {
    rows.iter().map(clean_row).collect()
}

fn clean_row(row: &RawHistoryRow) -> CleanedRecord {
    CleanedRecord {
        timestamp: row.timestamp,
        temperature: row.temperature,
        humidity: row.humidity,
        pressure: row.pressure,
        wind_speed_kmph: row.wind_speed_kmph,
        cloud_cover: row.cloud_cover,
        precipitation: row.precipitation,
        thunderstorm: thunderstorm_label(row.precipitation, row.humidity, row.pressure),
    }
}

/// Descriptive statistics of one column, ignoring missing values
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColumnSummary {
    pub column: &'static str,
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub median: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnSummary {
    fn from_values(column: &'static str, values: impl Iterator<Item = Option<f64>>) -> Self {
        let mut present = Vec::new();
        let mut missing = 0;
        for value in values {
            match value {
                Some(v) if !v.is_nan() => present.push(v),
                _ => missing += 1,
            }
        }
        present.sort_by(f64::total_cmp);

        Self {
            column,
            count: present.len(),
            missing,
            mean: mean(&present),
            std: sample_std(&present),
            min: present.first().copied(),
            p25: quantile(&present, 0.25),
            median: quantile(&present, 0.5),
            p75: quantile(&present, 0.75),
            max: present.last().copied(),
        }
    }
}

/// What the cleaner saw. Logged, never consumed by later pipeline steps.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CleaningReport {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    pub thunderstorm_cases: usize,
    pub thunderstorm_percent: f64,
}

impl CleaningReport {
    pub fn from_records(records: &[CleanedRecord]) -> Self {
        let columns = vec![
            ColumnSummary::from_values("temperature", records.iter().map(|r| r.temperature)),
            ColumnSummary::from_values("humidity", records.iter().map(|r| r.humidity)),
            ColumnSummary::from_values("pressure", records.iter().map(|r| r.pressure)),
            ColumnSummary::from_values(
                "wind_speed_kmph",
                records.iter().map(|r| r.wind_speed_kmph),
            ),
            ColumnSummary::from_values("cloud_cover", records.iter().map(|r| r.cloud_cover)),
            ColumnSummary::from_values("precipitation", records.iter().map(|r| r.precipitation)),
        ];
        let thunderstorm_cases = records.iter().filter(|r| r.thunderstorm).count();
        let thunderstorm_percent = if records.is_empty() {
            0.0
        } else {
            thunderstorm_cases as f64 / records.len() as f64 * 100.0
        };

        Self {
            rows: records.len(),
            columns,
            thunderstorm_cases,
            thunderstorm_percent,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.column == name)
    }

    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.missing).sum()
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Linear-interpolated quantile of sorted values
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn raw(hour: i64, precip: Option<f64>, humidity: Option<f64>, pressure: Option<f64>) -> RawHistoryRow {
        RawHistoryRow {
            timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() + Duration::hours(hour),
            temperature: Some(27.0),
            humidity,
            pressure,
            wind_speed_kmph: Some(12.0),
            cloud_cover: Some(80.0),
            precipitation: precip,
        }
    }

    #[test]
    fn test_label_requires_all_three_conditions() {
        assert!(thunderstorm_label(Some(6.0), Some(80.0), Some(1005.0)));
        assert!(!thunderstorm_label(Some(4.0), Some(80.0), Some(1005.0)));
        assert!(!thunderstorm_label(Some(6.0), Some(60.0), Some(1005.0)));
        assert!(!thunderstorm_label(Some(6.0), Some(80.0), Some(1012.0)));
    }

    #[test]
    fn test_label_boundaries_are_exclusive() {
        assert!(!thunderstorm_label(Some(6.0), Some(70.0), Some(1005.0)));
        assert!(thunderstorm_label(Some(6.0), Some(70.01), Some(1005.0)));
        assert!(!thunderstorm_label(Some(5.0), Some(80.0), Some(1005.0)));
        assert!(!thunderstorm_label(Some(6.0), Some(80.0), Some(1010.0)));
    }

    #[test]
    fn test_missing_input_yields_no_storm() {
        assert!(!thunderstorm_label(None, Some(80.0), Some(1005.0)));
        assert!(!thunderstorm_label(Some(6.0), None, Some(1005.0)));
        assert!(!thunderstorm_label(Some(6.0), Some(80.0), None));
    }

    #[test]
    fn test_clean_is_idempotent_and_order_preserving() {
        let rows = vec![
            raw(0, Some(0.0), Some(60.0), Some(1012.0)),
            raw(1, Some(8.0), Some(85.0), Some(1004.0)),
            raw(2, None, Some(85.0), Some(1004.0)),
        ];
        let first = clean(&rows);
        let second = clean(&rows);
        assert_eq!(first, second);
        assert_eq!(
            first.iter().map(|r| r.thunderstorm).collect::<Vec<_>>(),
            vec![false, true, false]
        );
        assert_eq!(first[2].precipitation, None);
    }

    #[test]
    fn test_report_counts_missing_and_storms() {
        let rows = vec![
            raw(0, Some(0.0), Some(60.0), Some(1012.0)),
            raw(1, Some(8.0), Some(85.0), Some(1004.0)),
            raw(2, None, None, Some(1004.0)),
            raw(3, Some(1.0), Some(70.0), Some(1006.0)),
        ];
        let report = CleaningReport::from_records(&clean(&rows));

        assert_eq!(report.rows, 4);
        assert_eq!(report.thunderstorm_cases, 1);
        assert!((report.thunderstorm_percent - 25.0).abs() < 1e-12);
        assert_eq!(report.column("precipitation").unwrap().missing, 1);
        assert_eq!(report.column("humidity").unwrap().missing, 1);
        assert_eq!(report.total_missing(), 2);

        let pressure = report.column("pressure").unwrap();
        assert_eq!(pressure.count, 4);
        assert_eq!(pressure.min, Some(1004.0));
        assert_eq!(pressure.max, Some(1012.0));
        assert_eq!(pressure.median, Some(1005.0));
    }

    #[test]
    fn test_report_on_empty_input() {
        let report = CleaningReport::from_records(&[]);
        assert_eq!(report.rows, 0);
        assert_eq!(report.thunderstorm_percent, 0.0);
        assert_eq!(report.column("temperature").unwrap().mean, None);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_label_is_conjunction_of_thresholds(
            precip in 0.0f64..50.0,
            humidity in 0.0f64..100.0,
            pressure in 980.0f64..1040.0
        ) {
            let expected = precip > 5.0 && humidity > 70.0 && pressure < 1010.0;
            prop_assert_eq!(
                thunderstorm_label(Some(precip), Some(humidity), Some(pressure)),
                expected
            );
        }
    }
}
