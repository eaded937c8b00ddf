//! Classification pipeline: sessions from a [`BarSource`] in, sorted records out.
//!
//! Sessions are independent, so they are classified on the rayon pool by
//! default. Results are sorted by `(index, date)` afterwards, which makes the
//! output identical whatever order the pool finished in.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use daytype_core::data::{BarSource, DataError, DateRange, SessionBars};
use daytype_core::{ClassificationRecord, ConfigError, SessionClassifier};

use crate::config::{RunConfig, RunPlan};

/// Errors from a classification run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Per-index session counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Sessions the source returned within the date range.
    pub sessions: usize,
    pub classified: usize,
    /// Sessions with no bars in the session or IB window.
    pub skipped: usize,
}

/// Output of a run: records sorted by `(index, date)` plus per-index counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationRun {
    pub records: Vec<ClassificationRecord>,
    pub stats: BTreeMap<String, IndexStats>,
}

impl ClassificationRun {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Skipped sessions across all indices.
    pub fn skipped(&self) -> usize {
        self.stats.values().map(|s| s.skipped).sum()
    }

    /// First and last classified date, across all indices.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.iter().map(|r| r.date).min()?;
        let last = self.records.iter().map(|r| r.date).max()?;
        Some((first, last))
    }
}

/// Classifies every session of the selected indices.
#[derive(Debug, Clone)]
pub struct Pipeline {
    classifier: SessionClassifier,
    range: DateRange,
    indices: Vec<String>,
    parallel: bool,
}

impl Pipeline {
    /// A pipeline over every index and date, running in parallel.
    pub fn new(classifier: SessionClassifier) -> Self {
        Self {
            classifier,
            range: DateRange::all(),
            indices: Vec::new(),
            parallel: true,
        }
    }

    pub fn from_plan(plan: &RunPlan) -> Self {
        Self {
            classifier: plan.classifier,
            range: plan.range,
            indices: plan.indices.clone(),
            parallel: plan.parallel,
        }
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    /// Restrict the run to these indices. Empty selects everything the source has.
    pub fn with_indices(mut self, indices: Vec<String>) -> Self {
        self.indices = indices;
        self
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn classifier(&self) -> &SessionClassifier {
        &self.classifier
    }

    /// Pull sessions from `source` and classify them.
    pub fn run(&self, source: &dyn BarSource) -> Result<ClassificationRun, RunError> {
        let indices = if self.indices.is_empty() {
            source.indices()
        } else {
            self.indices.clone()
        };

        let mut sessions = Vec::new();
        for index in &indices {
            let found = source.sessions(index, &self.range)?;
            debug!(source = source.name(), index = %index, sessions = found.len(), "loaded sessions");
            sessions.extend(found);
        }

        let mut run = self.classify_sessions(&sessions);
        // Requested indices with no sessions in range still get a stats row.
        for index in indices {
            run.stats.entry(index).or_default();
        }
        Ok(run)
    }

    /// Classify already-loaded sessions.
    pub fn classify_sessions(&self, sessions: &[SessionBars]) -> ClassificationRun {
        let outcomes: Vec<Option<ClassificationRecord>> = if self.parallel {
            sessions.par_iter().map(|s| self.classify_one(s)).collect()
        } else {
            sessions.iter().map(|s| self.classify_one(s)).collect()
        };

        let mut run = ClassificationRun::default();
        for (session, outcome) in sessions.iter().zip(outcomes) {
            let stats = run.stats.entry(session.index.clone()).or_default();
            stats.sessions += 1;
            match outcome {
                Some(record) => {
                    stats.classified += 1;
                    run.records.push(record);
                }
                None => {
                    stats.skipped += 1;
                    debug!(
                        index = %session.index,
                        date = %session.date,
                        bars = session.bars.len(),
                        "insufficient data, session skipped"
                    );
                }
            }
        }

        run.records
            .sort_by(|a, b| a.index.cmp(&b.index).then(a.date.cmp(&b.date)));

        for (index, stats) in &run.stats {
            info!(
                index = %index,
                sessions = stats.sessions,
                classified = stats.classified,
                skipped = stats.skipped,
                "classified index"
            );
        }
        run
    }

    fn classify_one(&self, session: &SessionBars) -> Option<ClassificationRecord> {
        self.classifier
            .classify(session.date, &session.index, &session.bars)
    }
}

/// Validate `config` and run it against `source`.
pub fn run_classification(
    source: &dyn BarSource,
    config: &RunConfig,
) -> Result<ClassificationRun, RunError> {
    let plan = config.validate()?;
    Pipeline::from_plan(&plan).run(source)
}
