//! Historical dataset files
//!
//! Raw history arrives as CSV with the weather provider's column names
//! (`date_time`, `tempC`, `humidity`, `pressure`, `windspeedKmph`,
//! `cloudcover`, `precipMM`). Empty cells are missing values; extra columns
//! are ignored.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use shared::{FeaturedRecord, RawHistoryRow};

use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
struct HistoryCsvRow {
    date_time: String,
    #[serde(rename = "tempC")]
    temp_c: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
    #[serde(rename = "windspeedKmph")]
    windspeed_kmph: Option<f64>,
    #[serde(rename = "cloudcover")]
    cloud_cover: Option<f64>,
    #[serde(rename = "precipMM")]
    precip_mm: Option<f64>,
}

/// Parse a history timestamp. Naive values are taken as UTC.
pub fn parse_history_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Read raw history rows from any CSV source
pub fn parse_raw_history<R: Read>(reader: R) -> AppResult<Vec<RawHistoryRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, result) in csv_reader.deserialize::<HistoryCsvRow>().enumerate() {
        // Header is line 1
        let line = index + 2;
        let row = result
            .map_err(|e| AppError::MalformedPayload(format!("history line {}: {}", line, e)))?;
        let timestamp = parse_history_timestamp(&row.date_time).ok_or_else(|| {
            AppError::MalformedPayload(format!(
                "history line {}: unparsable date_time '{}'",
                line, row.date_time
            ))
        })?;

        rows.push(RawHistoryRow {
            timestamp,
            temperature: row.temp_c,
            humidity: row.humidity,
            pressure: row.pressure,
            wind_speed_kmph: row.windspeed_kmph,
            cloud_cover: row.cloud_cover,
            precipitation: row.precip_mm,
        });
    }

    Ok(rows)
}

/// Read raw history rows from a CSV file
pub fn read_raw_history(path: &Path) -> AppResult<Vec<RawHistoryRow>> {
    let file = File::open(path)?;
    let rows = parse_raw_history(file)?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "Read raw history");
    Ok(rows)
}

/// Write featured rows as CSV, one column per field
pub fn write_featured<W: Write>(writer: W, rows: &[FeaturedRecord]) -> AppResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer
            .serialize(row)
            .map_err(|e| AppError::Internal(format!("featured CSV: {}", e)))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write featured rows to a CSV file, creating parent directories
pub fn write_featured_file(path: &Path, rows: &[FeaturedRecord]) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_featured(File::create(path)?, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const SAMPLE: &str = "\
date_time,maxtempC,tempC,humidity,pressure,windspeedKmph,cloudcover,precipMM
2019-06-01 00:00:00,31,27,82,1006,14,88,6.4
2019-06-01 01:00:00,31,26,,1007,12,90,0.0
";

    #[test]
    fn test_parse_raw_history() {
        let rows = parse_raw_history(SAMPLE.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].temperature, Some(27.0));
        assert_eq!(rows[0].precipitation, Some(6.4));
        assert_eq!(rows[1].humidity, None);
        assert_eq!(rows[1].timestamp.hour(), 1);
    }

    #[test]
    fn test_bad_number_is_malformed() {
        let body = "date_time,tempC,humidity,pressure,windspeedKmph,cloudcover,precipMM\n\
                    2019-06-01 00:00:00,hot,82,1006,14,88,6.4\n";
        let err = parse_raw_history(body.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::MalformedPayload(_)));
    }

    #[test]
    fn test_bad_timestamp_is_malformed() {
        let body = "date_time,tempC,humidity,pressure,windspeedKmph,cloudcover,precipMM\n\
                    yesterday,27,82,1006,14,88,6.4\n";
        let err = parse_raw_history(body.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::MalformedPayload(msg) if msg.contains("line 2")));
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(parse_history_timestamp("2019-06-01 00:00:00").is_some());
        assert!(parse_history_timestamp("2019-06-01 00:00").is_some());
        assert!(parse_history_timestamp("2019-06-01T00:00:00+05:30").is_some());
        assert!(parse_history_timestamp("01/06/2019").is_none());
    }
}
