//! Day-type distributions per index, by calendar year and by calendar month.
//!
//! Month tables pool every year together and always list months 1-12. Year
//! tables list every year from the first to the last one present. A key with
//! no sessions reports 0% for every day type, never a missing cell.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use daytype_core::{ClassificationRecord, DayType};

/// What a distribution row is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    Year,
    Month,
}

impl Grouping {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
        }
    }
}

/// Session counts per day type for one year or month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionRow {
    /// Calendar year, or month number 1-12.
    pub key: i32,
    /// Counts in [`DayType::ALL`] order.
    pub counts: [usize; 6],
}

fn column(day_type: DayType) -> usize {
    match day_type {
        DayType::NonTrend => 0,
        DayType::Normal => 1,
        DayType::NormalVariation => 2,
        DayType::NeutralCenter => 3,
        DayType::NeutralExtreme => 4,
        DayType::Trend => 5,
    }
}

impl DistributionRow {
    pub fn new(key: i32) -> Self {
        Self { key, counts: [0; 6] }
    }

    pub fn add(&mut self, day_type: DayType) {
        self.counts[column(day_type)] += 1;
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn count(&self, day_type: DayType) -> usize {
        self.counts[column(day_type)]
    }

    /// Share of sessions with this day type, in percent. 0 for an empty row.
    pub fn percent(&self, day_type: DayType) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.count(day_type) as f64 * 100.0 / total as f64
    }

    /// Percentages in [`DayType::ALL`] order.
    pub fn percentages(&self) -> [f64; 6] {
        DayType::ALL.map(|dt| self.percent(dt))
    }
}

/// One index's distribution, keyed by year or by month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionTable {
    pub index: String,
    pub grouping: Grouping,
    pub rows: Vec<DistributionRow>,
}

impl DistributionTable {
    /// Year x day-type counts for `index`. Records of other indices are ignored.
    pub fn by_year(index: &str, records: &[ClassificationRecord]) -> Self {
        let years: Vec<i32> = records
            .iter()
            .filter(|r| r.index == index)
            .map(ClassificationRecord::year)
            .collect();
        let keys = match (years.iter().min(), years.iter().max()) {
            (Some(&first), Some(&last)) => (first..=last).collect(),
            _ => Vec::new(),
        };
        Self::tally(index, Grouping::Year, keys, records, |r| r.year())
    }

    /// Month x day-type counts for `index`, pooled across years.
    pub fn by_month(index: &str, records: &[ClassificationRecord]) -> Self {
        Self::tally(index, Grouping::Month, (1..=12).collect(), records, |r| {
            r.month() as i32
        })
    }

    fn tally(
        index: &str,
        grouping: Grouping,
        keys: Vec<i32>,
        records: &[ClassificationRecord],
        key_of: impl Fn(&ClassificationRecord) -> i32,
    ) -> Self {
        let mut rows: Vec<DistributionRow> = keys.into_iter().map(DistributionRow::new).collect();
        for record in records.iter().filter(|r| r.index == index) {
            let key = key_of(record);
            if let Some(row) = rows.iter_mut().find(|row| row.key == key) {
                row.add(record.day_type);
            }
        }
        Self {
            index: index.to_string(),
            grouping,
            rows,
        }
    }

    pub fn row(&self, key: i32) -> Option<&DistributionRow> {
        self.rows.iter().find(|row| row.key == key)
    }

    /// All rows summed into one. The returned row has key 0.
    pub fn overall(&self) -> DistributionRow {
        let mut total = DistributionRow::new(0);
        for row in &self.rows {
            for (sum, count) in total.counts.iter_mut().zip(row.counts) {
                *sum += count;
            }
        }
        total
    }
}

/// Both distribution tables for one index plus its date span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDistribution {
    pub index: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub by_year: DistributionTable,
    pub by_month: DistributionTable,
}

impl IndexDistribution {
    pub fn sessions(&self) -> usize {
        self.by_month.overall().total()
    }
}

/// Distributions for every index in `records`, sorted by index name.
pub fn distributions(records: &[ClassificationRecord]) -> Vec<IndexDistribution> {
    let indices: BTreeSet<&str> = records.iter().map(|r| r.index.as_str()).collect();
    indices
        .into_iter()
        .filter_map(|index| {
            let dates = records.iter().filter(|r| r.index == index).map(|r| r.date);
            let first_date = dates.clone().min()?;
            let last_date = dates.max()?;
            Some(IndexDistribution {
                index: index.to_string(),
                first_date,
                last_date,
                by_year: DistributionTable::by_year(index, records),
                by_month: DistributionTable::by_month(index, records),
            })
        })
        .collect()
}
