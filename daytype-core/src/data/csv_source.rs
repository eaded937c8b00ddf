//! CSV intraday bar import.
//!
//! Expected header: `symbol,timestamp,open,high,low,close,volume` (volume may
//! be empty). Timestamps are either naive exchange-local wall-clock times or
//! carry an explicit offset, in which case they are converted to the
//! exchange offset before grouping into sessions.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::source::{BarSource, DataError, DateRange, SessionBars};
use super::store::{IngestSummary, SessionStore};
use crate::domain::Bar;

#[derive(Debug, Deserialize)]
struct BarRow {
    symbol: String,
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%z", "%Y-%m-%d %H:%M:%S%:z"];

/// Parse a bar timestamp into exchange-local wall-clock time.
pub fn parse_timestamp(value: &str, exchange_offset: &FixedOffset) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(exchange_offset).naive_local());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.with_timezone(exchange_offset).naive_local());
        }
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Intraday bars loaded from a CSV file.
#[derive(Debug, Clone)]
pub struct CsvBarSource {
    path: PathBuf,
    store: SessionStore,
}

impl CsvBarSource {
    /// Load every row of `path`, converting offsets to `exchange_offset`.
    pub fn open(path: &Path, exchange_offset: FixedOffset) -> Result<Self, DataError> {
        let file = File::open(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = read_bars(file, &path.display().to_string(), exchange_offset)?;
        Ok(Self {
            path: path.to_path_buf(),
            store,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Ingest totals across all indices.
    pub fn summary(&self) -> IngestSummary {
        let mut total = IngestSummary::default();
        for index in self.store.indices() {
            if let Some(s) = self.store.summary(&index) {
                total.merge(s);
            }
        }
        total
    }
}

impl BarSource for CsvBarSource {
    fn name(&self) -> &str {
        self.store.name()
    }

    fn indices(&self) -> Vec<String> {
        self.store.indices()
    }

    fn sessions(&self, index: &str, range: &DateRange) -> Result<Vec<SessionBars>, DataError> {
        self.store.sessions(index, range)
    }
}

/// Read bar rows from any reader into a [`SessionStore`].
pub fn read_bars<R: Read>(
    reader: R,
    name: &str,
    exchange_offset: FixedOffset,
) -> Result<SessionStore, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut by_index: BTreeMap<String, Vec<Bar>> = BTreeMap::new();

    for (i, row) in rdr.deserialize::<BarRow>().enumerate() {
        let row = row?;
        // Header is line 1.
        let line = i as u64 + 2;
        let timestamp = parse_timestamp(&row.timestamp, &exchange_offset).ok_or_else(|| {
            DataError::BadTimestamp {
                row: line,
                value: row.timestamp.clone(),
            }
        })?;
        by_index.entry(row.symbol).or_default().push(Bar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume.unwrap_or(0.0),
        });
    }

    if by_index.is_empty() {
        warn!(source = name, "no bar rows found");
    }
    for (index, bars) in &by_index {
        debug!(source = name, index = %index, rows = bars.len(), "read bar rows");
    }

    Ok(SessionStore::from_bars(name, by_index))
}
