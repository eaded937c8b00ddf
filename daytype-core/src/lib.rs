//! Day-type core: session metrics and Market Profile day-type classification.
//!
//! This crate contains the decision logic of the workspace:
//! - Domain types (intraday bars, day-type and IB-size labels, output records)
//! - Session window configuration, validated at construction
//! - Session metrics extraction (Initial Balance, day range, extensions, close position)
//! - IB-size banding and the ordered day-type rule table
//! - The `BarSource` seam plus CSV and in-memory sources

pub mod classify;
pub mod config;
pub mod data;
pub mod domain;
pub mod metrics;

pub use classify::{
    classify_day_type, classify_day_type_explained, classify_ib_size, Classification,
    DayTypeRule, DayTypeThresholds, IbSizeBands, SessionClassifier, SessionReport,
};
pub use config::{ConfigError, SessionWindow};
pub use domain::{Bar, ClassificationRecord, DayType, IbSize};
pub use metrics::{extract, SessionMetrics};
