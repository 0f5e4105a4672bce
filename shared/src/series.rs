//! Time-ordered series
//!
//! Lag and rolling features are only meaningful when every row's neighbour is
//! its true predecessor in time. [`OrderedSeries`] carries that guarantee in
//! its type: it can only be built from rows whose timestamps are strictly
//! ascending.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{CleanedRecord, FeaturedRecord, RawHistoryRow, WeatherObservation};

/// Anything positioned on the time axis
pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

impl Timestamped for RawHistoryRow {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Timestamped for CleanedRecord {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Timestamped for FeaturedRecord {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Timestamped for WeatherObservation {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Ordering violations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("duplicate timestamp {0}")]
    DuplicateTimestamp(DateTime<Utc>),

    #[error("row {index} at {timestamp} is earlier than its predecessor")]
    OutOfOrder {
        index: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Rows with strictly ascending timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedSeries<T> {
    rows: Vec<T>,
}

impl<T: Timestamped> OrderedSeries<T> {
    /// Accept rows that are already in order, rejecting any regression or
    /// repeated timestamp.
    pub fn try_from_sorted(rows: Vec<T>) -> Result<Self, SeriesError> {
        check_strictly_ascending(&rows)?;
        Ok(Self { rows })
    }

    /// Sort rows by timestamp, then reject duplicates. The sort is stable.
    pub fn sort_from(mut rows: Vec<T>) -> Result<Self, SeriesError> {
        rows.sort_by_key(|row| row.timestamp());
        check_strictly_ascending(&rows)?;
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.rows.first().map(Timestamped::timestamp)
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.rows.last().map(Timestamped::timestamp)
    }
}

fn check_strictly_ascending<T: Timestamped>(rows: &[T]) -> Result<(), SeriesError> {
    for (index, pair) in rows.windows(2).enumerate() {
        let (prev, next) = (pair[0].timestamp(), pair[1].timestamp());
        if next == prev {
            return Err(SeriesError::DuplicateTimestamp(next));
        }
        if next < prev {
            return Err(SeriesError::OutOfOrder {
                index: index + 1,
                timestamp: next,
            });
        }
    }
    Ok(())
}
