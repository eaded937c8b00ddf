//! Record and manifest persistence.
//!
//! Two artifacts per run:
//! - **Records CSV** (`mp_daytype_stats_<YYYY-MM-DD>.csv`): one row per
//!   classified session, columns `date,index,day_type,ib_size,ib_pct,ib_ratio,day_range`
//! - **Manifest** (`manifest.json`): config fingerprint, counts and date span
//!
//! The manifest carries a `schema_version`; newer versions are rejected on load.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use daytype_core::ClassificationRecord;

use crate::pipeline::{ClassificationRun, IndexStats};

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Records CSV header, in column order.
pub const RECORD_COLUMNS: [&str; 7] = [
    "date", "index", "day_type", "ib_size", "ib_pct", "ib_ratio", "day_range",
];

/// Errors reading or writing run artifacts.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to flush CSV writer: {0}")]
    Flush(#[source] std::io::Error),
    #[error("CSV output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("unsupported schema version {found} (max supported: {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ─── Records CSV ────────────────────────────────────────────────────

/// File name for a records CSV produced on `run_date`.
pub fn records_filename(run_date: NaiveDate) -> String {
    format!("mp_daytype_stats_{}.csv", run_date.format("%Y-%m-%d"))
}

/// Write records as CSV, header included, in the order given.
pub fn write_records<W: Write>(writer: W, records: &[ClassificationRecord]) -> Result<(), ExportError> {
    let mut wtr = records_writer(writer, records)?;
    wtr.flush().map_err(ExportError::Flush)?;
    Ok(())
}

// The header is written even when there are no records.
fn records_writer<W: Write>(
    writer: W,
    records: &[ClassificationRecord],
) -> Result<csv::Writer<W>, ExportError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(RECORD_COLUMNS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    Ok(wtr)
}

/// Render records as a CSV string.
pub fn export_records_csv(records: &[ClassificationRecord]) -> Result<String, ExportError> {
    let wtr = records_writer(vec![], records)?;
    let data = wtr.into_inner().map_err(|e| ExportError::Flush(e.into_error()))?;
    Ok(String::from_utf8(data)?)
}

/// Parse a records CSV. Day-type and IB-size labels must be the exact
/// labels written by [`write_records`].
pub fn read_records<R: Read>(reader: R) -> Result<Vec<ClassificationRecord>, ExportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let records = rdr
        .deserialize::<ClassificationRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

pub fn load_records(path: &Path) -> Result<Vec<ClassificationRecord>, ExportError> {
    let file = std::fs::File::open(path).map_err(io_error(path))?;
    read_records(file)
}

/// Write `records` to `output_dir/mp_daytype_stats_<run_date>.csv`,
/// creating the directory if needed. Returns the file path.
pub fn save_records(
    records: &[ClassificationRecord],
    output_dir: &Path,
    run_date: NaiveDate,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(output_dir).map_err(io_error(output_dir))?;
    let path = output_dir.join(records_filename(run_date));
    let file = std::fs::File::create(&path).map_err(io_error(&path))?;
    write_records(file, records)?;
    Ok(path)
}

// ─── Manifest ───────────────────────────────────────────────────────

/// Summary of a classification run, saved next to its records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// BLAKE3 hash of the run configuration.
    pub config_fingerprint: String,
    /// Name of the bar source the run read from.
    pub source: String,
    pub records_file: String,
    pub record_count: usize,
    pub skipped_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub indices: BTreeMap<String, IndexStats>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunManifest {
    pub fn new(
        run: &ClassificationRun,
        config_fingerprint: impl Into<String>,
        source: impl Into<String>,
        records_file: impl Into<String>,
    ) -> Self {
        let span = run.date_span();
        Self {
            schema_version: SCHEMA_VERSION,
            config_fingerprint: config_fingerprint.into(),
            source: source.into(),
            records_file: records_file.into(),
            record_count: run.records.len(),
            skipped_count: run.skipped(),
            first_date: span.map(|(first, _)| first),
            last_date: span.map(|(_, last)| last),
            indices: run.stats.clone(),
        }
    }
}

/// Serialize a manifest to pretty JSON.
pub fn export_manifest_json(manifest: &RunManifest) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(manifest)?)
}

/// Deserialize a manifest, rejecting unknown schema versions.
pub fn import_manifest_json(json: &str) -> Result<RunManifest, ExportError> {
    let manifest: RunManifest = serde_json::from_str(json)?;
    if manifest.schema_version > SCHEMA_VERSION {
        return Err(ExportError::UnsupportedSchema {
            found: manifest.schema_version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(manifest)
}

/// Write `output_dir/manifest.json`. Returns the file path.
pub fn save_manifest(manifest: &RunManifest, output_dir: &Path) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(output_dir).map_err(io_error(output_dir))?;
    let path = output_dir.join(MANIFEST_FILENAME);
    let json = export_manifest_json(manifest)?;
    std::fs::write(&path, json).map_err(io_error(&path))?;
    Ok(path)
}

pub fn load_manifest(path: &Path) -> Result<RunManifest, ExportError> {
    let json = std::fs::read_to_string(path).map_err(io_error(path))?;
    import_manifest_json(&json)
}
