//! Day-type runner: classification runs, persistence and distribution reports.
//!
//! This crate builds on `daytype-core` to provide:
//! - TOML run configuration with NSE defaults and a BLAKE3 fingerprint
//! - A parallel classification pipeline over any `BarSource`
//! - Records CSV export/import and a run manifest
//! - Year and month day-type distributions
//! - CSV pivot and Markdown reports

pub mod aggregate;
pub mod config;
pub mod export;
pub mod pipeline;
pub mod report;

pub use aggregate::{distributions, DistributionRow, DistributionTable, Grouping, IndexDistribution};
pub use config::{RunConfig, RunConfigError, RunPlan};
pub use export::{
    load_manifest, load_records, records_filename, save_manifest, save_records, ExportError,
    RunManifest, SCHEMA_VERSION,
};
pub use pipeline::{run_classification, ClassificationRun, IndexStats, Pipeline, RunError};
pub use report::{generate_report, save_reports};
