//! Bar: one intraday price observation.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single index at a single intraday timestamp.
///
/// `timestamp` is wall-clock time at the exchange. Anything arriving in
/// another zone is converted before it becomes a `Bar`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Exchange-local trading date of this bar.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Exchange-local time of day of this bar.
    pub fn time(&self) -> NaiveTime {
        self.timestamp.time()
    }

    /// Returns true if any price field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low and open/close inside [low, high].
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}
