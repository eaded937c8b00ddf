//! Bar ingestion and session grouping

pub mod csv_source;
pub mod source;
pub mod store;

pub use csv_source::{parse_timestamp, read_bars, CsvBarSource};
pub use source::{BarSource, DataError, DateRange, SessionBars};
pub use store::{canonicalize, group_by_date, IngestSummary, SessionStore};
