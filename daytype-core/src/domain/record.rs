//! ClassificationRecord: one classified session for one index.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::day_type::{DayType, IbSize};

/// The per-(day, index) output of the classifier.
///
/// Created once after a session's metrics are computed and never mutated.
/// Field order matches the persisted CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub date: NaiveDate,
    pub index: String,
    pub day_type: DayType,
    pub ib_size: IbSize,
    pub ib_pct: f64,
    pub ib_ratio: f64,
    pub day_range: f64,
}

impl ClassificationRecord {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Calendar month, 1-12.
    pub fn month(&self) -> u32 {
        self.date.month()
    }
}
