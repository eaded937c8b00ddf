//! In-memory session store.
//!
//! Canonicalizes raw bars (drop void bars, sort by timestamp, drop duplicate
//! timestamps) and groups them into per-date sessions. Bars whose open or
//! close sits outside their own high/low are kept and counted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use super::source::{BarSource, DataError, DateRange, SessionBars};
use crate::domain::Bar;

/// Counts from canonicalizing one index's bars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub accepted: usize,
    pub dropped_void: usize,
    pub dropped_duplicates: usize,
    /// Accepted bars that fail [`Bar::is_sane`].
    pub inconsistent: usize,
}

impl IngestSummary {
    pub fn merge(&mut self, other: IngestSummary) {
        self.accepted += other.accepted;
        self.dropped_void += other.dropped_void;
        self.dropped_duplicates += other.dropped_duplicates;
        self.inconsistent += other.inconsistent;
    }
}

/// Sort bars by timestamp and keep the first bar for each timestamp.
/// Void (NaN) bars are dropped; inconsistent OHLC bars stay in.
pub fn canonicalize(mut bars: Vec<Bar>) -> (Vec<Bar>, IngestSummary) {
    let total = bars.len();
    bars.retain(|b| !b.is_void());
    let dropped_void = total - bars.len();

    bars.sort_by_key(|b| b.timestamp);
    let before_dedup = bars.len();
    bars.dedup_by_key(|b| b.timestamp);
    let dropped_duplicates = before_dedup - bars.len();

    let summary = IngestSummary {
        accepted: bars.len(),
        dropped_void,
        dropped_duplicates,
        inconsistent: bars.iter().filter(|b| !b.is_sane()).count(),
    };
    (bars, summary)
}

/// Split canonical bars into sessions keyed by exchange-local date.
pub fn group_by_date(bars: Vec<Bar>) -> BTreeMap<NaiveDate, Vec<Bar>> {
    let mut sessions: BTreeMap<NaiveDate, Vec<Bar>> = BTreeMap::new();
    for bar in bars {
        sessions.entry(bar.date()).or_default().push(bar);
    }
    sessions
}

/// Bars for any number of indices, held in memory and served per session.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    name: String,
    indices: BTreeMap<String, BTreeMap<NaiveDate, Vec<Bar>>>,
    summaries: BTreeMap<String, IngestSummary>,
}

impl SessionStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build a store from raw bars per index.
    pub fn from_bars<I>(name: impl Into<String>, bars_by_index: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<Bar>)>,
    {
        let mut store = Self::new(name);
        for (index, bars) in bars_by_index {
            store.insert(index, bars);
        }
        store
    }

    /// Add raw bars for an index, merging with anything already stored.
    pub fn insert(&mut self, index: String, bars: Vec<Bar>) {
        let mut all: Vec<Bar> = self
            .indices
            .remove(&index)
            .map(|sessions| sessions.into_values().flatten().collect())
            .unwrap_or_default();
        all.extend(bars);

        let (canonical, summary) = canonicalize(all);
        if summary.dropped_void > 0 {
            warn!(index = %index, dropped = summary.dropped_void, "dropped void bars");
        }
        if summary.inconsistent > 0 {
            warn!(
                index = %index,
                bars = summary.inconsistent,
                "kept bars with open/close outside high/low"
            );
        }
        let totals = self.summaries.entry(index.clone()).or_default();
        totals.accepted = summary.accepted;
        totals.dropped_void += summary.dropped_void;
        totals.dropped_duplicates += summary.dropped_duplicates;
        totals.inconsistent = summary.inconsistent;
        self.indices.insert(index, group_by_date(canonical));
    }

    pub fn summary(&self, index: &str) -> Option<IngestSummary> {
        self.summaries.get(index).copied()
    }

    pub fn session_count(&self, index: &str) -> usize {
        self.indices.get(index).map_or(0, BTreeMap::len)
    }

    /// Bars for one index on one date, if any.
    pub fn session(&self, index: &str, date: NaiveDate) -> Option<&[Bar]> {
        self.indices
            .get(index)
            .and_then(|sessions| sessions.get(&date))
            .map(Vec::as_slice)
    }
}

impl BarSource for SessionStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn indices(&self) -> Vec<String> {
        self.indices.keys().cloned().collect()
    }

    fn sessions(&self, index: &str, range: &DateRange) -> Result<Vec<SessionBars>, DataError> {
        let sessions = self
            .indices
            .get(index)
            .ok_or_else(|| DataError::UnknownIndex(index.to_string()))?;
        Ok(sessions
            .iter()
            .filter(|(date, _)| range.contains(**date))
            .map(|(date, bars)| SessionBars {
                index: index.to_string(),
                date: *date,
                bars: bars.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, h: u32, m: u32, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 4, day)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 0.0,
        }
    }

    #[test]
    fn canonicalize_sorts_and_dedupes_keeping_first() {
        let bars = vec![bar(1, 10, 0, 3.0), bar(1, 9, 15, 1.0), bar(1, 10, 0, 99.0)];
        let (out, summary) = canonicalize(bars);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].close, 1.0);
        assert_eq!(out[1].close, 3.0);
        assert_eq!(summary.dropped_duplicates, 1);
        assert_eq!(summary.accepted, 2);
    }

    #[test]
    fn canonicalize_drops_void_bars() {
        let mut void = bar(1, 9, 30, 2.0);
        void.high = f64::NAN;
        let (out, summary) = canonicalize(vec![bar(1, 9, 15, 1.0), void]);
        assert_eq!(out.len(), 1);
        assert_eq!(summary.dropped_void, 1);
    }

    #[test]
    fn canonicalize_keeps_inconsistent_bars() {
        let mut glitch = bar(1, 9, 15, 100.0);
        glitch.close = glitch.high + 0.05;
        let (out, summary) = canonicalize(vec![glitch, bar(1, 9, 30, 100.0)]);
        assert_eq!(out.len(), 2);
        assert_eq!(summary.inconsistent, 1);
        assert_eq!(summary.dropped_void, 0);
    }

    #[test]
    fn store_groups_sessions_by_date() {
        let store = SessionStore::from_bars(
            "memory",
            vec![(
                "NIFTY_50".to_string(),
                vec![bar(2, 9, 15, 10.0), bar(1, 9, 15, 5.0), bar(1, 9, 30, 6.0)],
            )],
        );
        assert_eq!(store.session_count("NIFTY_50"), 2);
        let sessions = store.sessions("NIFTY_50", &DateRange::all()).unwrap();
        assert_eq!(sessions[0].date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert_eq!(sessions[0].bars.len(), 2);
        assert_eq!(sessions[1].bars.len(), 1);
    }

    #[test]
    fn store_filters_by_range() {
        let store = SessionStore::from_bars(
            "memory",
            vec![("X".to_string(), vec![bar(1, 9, 15, 1.0), bar(2, 9, 15, 1.0), bar(3, 9, 15, 1.0)])],
        );
        let day = |d| NaiveDate::from_ymd_opt(2024, 4, d).unwrap();
        let range = DateRange::new(Some(day(2)), Some(day(2)));
        let sessions = store.sessions("X", &range).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].date, day(2));
    }

    #[test]
    fn unknown_index_is_an_error() {
        let store = SessionStore::new("empty");
        assert!(matches!(
            store.sessions("NOPE", &DateRange::all()),
            Err(DataError::UnknownIndex(_))
        ));
    }

    #[test]
    fn insert_merges_with_existing_bars() {
        let mut store = SessionStore::new("memory");
        store.insert("X".into(), vec![bar(1, 9, 15, 1.0)]);
        store.insert("X".into(), vec![bar(1, 9, 30, 2.0), bar(1, 9, 15, 7.0)]);
        let session = store.session("X", NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()).unwrap();
        assert_eq!(session.len(), 2);
        assert_eq!(session[0].close, 1.0);
        let summary = store.summary("X").unwrap();
        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.dropped_duplicates, 1);
    }
}
