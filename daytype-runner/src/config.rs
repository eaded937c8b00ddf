//! Serializable run configuration.
//!
//! A run is described by a TOML document with four optional tables. Every
//! field has a default, and the defaults describe the NSE cash session, so an
//! empty document is a valid configuration:
//!
//! ```toml
//! [session]
//! open = "09:15"
//! close = "15:30"
//! ib_minutes = 60        # or: ib_end = "10:15"
//! utc_offset = "+05:30"
//!
//! [ib_size]
//! small_below = 0.33
//! medium_up_to = 1.0
//!
//! [thresholds]
//! very_wide_ib = 0.80
//! wide_ib = 0.50
//! narrow_ib = 0.25
//! near_mid = 0.30
//! near_extreme = 0.15
//!
//! [run]
//! indices = ["NIFTY_50", "NIFTY_BANK"]
//! start_date = "2024-01-01"
//! end_date = "2024-12-31"
//! parallel = true
//! ```
//!
//! Times and dates stay strings until [`RunConfig::validate`] turns the whole
//! document into validated core types.

use std::path::{Path, PathBuf};

use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use daytype_core::config::{parse_time, parse_utc_offset};
use daytype_core::data::DateRange;
use daytype_core::{ConfigError, DayTypeThresholds, IbSizeBands, SessionClassifier, SessionWindow};

/// Unique identifier for a run configuration (content-addressable hash).
pub type ConfigFingerprint = String;

/// IB length used when neither `ib_minutes` nor `ib_end` is given.
pub const DEFAULT_IB_MINUTES: i64 = 60;

/// Errors loading a configuration document.
#[derive(Debug, Error)]
pub enum RunConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),
}

/// Full configuration for one classification run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub session: SessionConfig,
    pub ib_size: IbSizeBands,
    pub thresholds: DayTypeThresholds,
    pub run: RunSection,
}

/// The `[session]` table. Times are exchange-local wall-clock times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub open: String,
    pub close: String,
    /// IB length in minutes from the open. Ignored when `ib_end` is set.
    pub ib_minutes: Option<i64>,
    /// Explicit IB cutoff time.
    pub ib_end: Option<String>,
    /// Exchange offset from UTC, used to convert offset-carrying timestamps.
    pub utc_offset: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            open: "09:15".into(),
            close: "15:30".into(),
            ib_minutes: None,
            ib_end: None,
            utc_offset: "+05:30".into(),
        }
    }
}

/// The `[run]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    /// Indices to classify. Empty means every index the source carries.
    pub indices: Vec<String>,
    /// First date to classify (inclusive), `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// Last date to classify (inclusive), `YYYY-MM-DD`.
    pub end_date: Option<String>,
    /// Classify sessions on the rayon pool instead of sequentially.
    pub parallel: bool,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            indices: Vec::new(),
            start_date: None,
            end_date: None,
            parallel: true,
        }
    }
}

/// A configuration after validation: everything the pipeline needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub classifier: SessionClassifier,
    pub exchange_offset: FixedOffset,
    pub range: DateRange,
    pub indices: Vec<String>,
    pub parallel: bool,
}

impl RunConfig {
    /// Parse a TOML document. Validation is a separate step.
    pub fn from_toml(s: &str) -> Result<Self, RunConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self, RunConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| RunConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Build the session window from the `[session]` table.
    pub fn window(&self) -> Result<SessionWindow, ConfigError> {
        let open = parse_time(&self.session.open)?;
        let close = parse_time(&self.session.close)?;
        match &self.session.ib_end {
            Some(ib_end) => SessionWindow::new(open, close, parse_time(ib_end)?),
            None => SessionWindow::with_ib_minutes(
                open,
                close,
                self.session.ib_minutes.unwrap_or(DEFAULT_IB_MINUTES),
            ),
        }
    }

    pub fn exchange_offset(&self) -> Result<FixedOffset, ConfigError> {
        parse_utc_offset(&self.session.utc_offset)
    }

    /// The inclusive date filter from the `[run]` table.
    pub fn date_range(&self) -> Result<DateRange, ConfigError> {
        let start = self.run.start_date.as_deref().map(parse_date).transpose()?;
        let end = self.run.end_date.as_deref().map(parse_date).transpose()?;
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(ConfigError::InvertedDateRange {
                    start: s.to_string(),
                    end: e.to_string(),
                });
            }
        }
        Ok(DateRange::new(start, end))
    }

    /// Validate every table and produce a [`RunPlan`].
    pub fn validate(&self) -> Result<RunPlan, ConfigError> {
        let classifier = SessionClassifier::new(self.window()?, self.ib_size, self.thresholds)?;
        Ok(RunPlan {
            classifier,
            exchange_offset: self.exchange_offset()?,
            range: self.date_range()?,
            indices: self.run.indices.clone(),
            parallel: self.run.parallel,
        })
    }

    /// Deterministic BLAKE3 hash of this configuration.
    ///
    /// Two runs with identical configs share a fingerprint, so their outputs
    /// are directly comparable.
    pub fn fingerprint(&self) -> Result<ConfigFingerprint, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate(s.to_string()))
}
