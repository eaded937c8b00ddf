//! Bar source trait and structured error types.
//!
//! The BarSource trait abstracts over wherever intraday bars come from (a CSV
//! export, an in-memory fixture, a broker client living outside this
//! workspace) so the classification pipeline never sees acquisition details.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::Bar;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unparsable timestamp '{value}'")]
    BadTimestamp { row: u64, value: String },

    #[error("unknown index '{0}'")]
    UnknownIndex(String),
}

/// Inclusive calendar date filter. `None` on either side means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// One index's bars for one trading date, time-ordered and unique by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionBars {
    pub index: String,
    pub date: NaiveDate,
    pub bars: Vec<Bar>,
}

/// Trait for intraday bar sources.
pub trait BarSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Index identifiers this source can serve, sorted.
    fn indices(&self) -> Vec<String>;

    /// All sessions for `index` whose date falls inside `range`, in date order.
    fn sessions(&self, index: &str, range: &DateRange) -> Result<Vec<SessionBars>, DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn unbounded_range_contains_everything() {
        assert!(DateRange::all().contains(d(1999, 1, 1)));
        assert!(DateRange::all().contains(d(2099, 12, 31)));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let r = DateRange::new(Some(d(2024, 1, 1)), Some(d(2024, 1, 31)));
        assert!(r.contains(d(2024, 1, 1)));
        assert!(r.contains(d(2024, 1, 31)));
        assert!(!r.contains(d(2023, 12, 31)));
        assert!(!r.contains(d(2024, 2, 1)));
    }

    #[test]
    fn half_open_range() {
        let r = DateRange::new(Some(d(2024, 6, 1)), None);
        assert!(!r.contains(d(2024, 5, 31)));
        assert!(r.contains(d(2030, 1, 1)));
    }
}
