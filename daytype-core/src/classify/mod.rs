//! Classification: IB sizing, the day-type rule table, and the per-session
//! facade that ties them to metric extraction.

pub mod ib_size;
pub mod rules;

pub use ib_size::{classify_ib_size, IbSizeBands};
pub use rules::{
    classify_day_type, classify_day_type_explained, Classification, DayTypeRule,
    DayTypeThresholds, RULE_TABLE,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SessionWindow};
use crate::domain::{Bar, ClassificationRecord, IbSize};
use crate::metrics::{extract, SessionMetrics};

/// Everything needed to classify a session, validated up front.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawSessionClassifier")]
pub struct SessionClassifier {
    window: SessionWindow,
    ib_bands: IbSizeBands,
    thresholds: DayTypeThresholds,
}

#[derive(Deserialize)]
struct RawSessionClassifier {
    window: SessionWindow,
    ib_bands: IbSizeBands,
    thresholds: DayTypeThresholds,
}

impl TryFrom<RawSessionClassifier> for SessionClassifier {
    type Error = ConfigError;

    fn try_from(raw: RawSessionClassifier) -> Result<Self, Self::Error> {
        Self::new(raw.window, raw.ib_bands, raw.thresholds)
    }
}

/// Full output for a single session: metrics, IB size and the rule trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub metrics: SessionMetrics,
    pub ib_size: IbSize,
    pub classification: Classification,
}

impl SessionClassifier {
    pub fn new(
        window: SessionWindow,
        ib_bands: IbSizeBands,
        thresholds: DayTypeThresholds,
    ) -> Result<Self, ConfigError> {
        ib_bands.validate()?;
        thresholds.validate()?;
        Ok(Self {
            window,
            ib_bands,
            thresholds,
        })
    }

    pub fn window(&self) -> &SessionWindow {
        &self.window
    }

    pub fn ib_bands(&self) -> &IbSizeBands {
        &self.ib_bands
    }

    pub fn thresholds(&self) -> &DayTypeThresholds {
        &self.thresholds
    }

    /// Extract and classify one session, keeping the intermediate metrics.
    ///
    /// `None` means the day has insufficient data and should be skipped.
    pub fn evaluate(&self, bars: &[Bar]) -> Option<SessionReport> {
        let metrics = extract(bars, &self.window)?;
        Some(SessionReport {
            metrics,
            ib_size: classify_ib_size(metrics.ib_pct, &self.ib_bands),
            classification: classify_day_type_explained(&metrics, &self.thresholds),
        })
    }

    /// Produce the output record for one (day, index) session.
    pub fn classify(&self, date: NaiveDate, index: &str, bars: &[Bar]) -> Option<ClassificationRecord> {
        let report = self.evaluate(bars)?;
        Some(ClassificationRecord {
            date,
            index: index.to_string(),
            day_type: report.classification.day_type,
            ib_size: report.ib_size,
            ib_pct: report.metrics.ib_pct,
            ib_ratio: report.metrics.ib_ratio,
            day_range: report.metrics.day_range,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DayType;

    fn bar(date: NaiveDate, h: u32, m: u32, o: f64, hi: f64, lo: f64, c: f64) -> Bar {
        Bar {
            timestamp: date.and_hms_opt(h, m, 0).unwrap(),
            open: o,
            high: hi,
            low: lo,
            close: c,
            volume: 0.0,
        }
    }

    #[test]
    fn classifies_a_trend_session_end_to_end() {
        let d = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        // IB 1000-1020, then a one-way rally closing at the high.
        let bars = vec![
            bar(d, 9, 15, 1000.0, 1020.0, 1000.0, 1008.0),
            bar(d, 9, 45, 1008.0, 1009.0, 1002.0, 1005.0),
            bar(d, 11, 0, 1005.0, 1050.0, 1004.0, 1048.0),
            bar(d, 15, 15, 1048.0, 1100.0, 1047.0, 1097.0),
        ];
        let rec = SessionClassifier::default()
            .classify(d, "NIFTY_50", &bars)
            .unwrap();
        assert_eq!(rec.day_type, DayType::Trend);
        assert_eq!(rec.ib_size, IbSize::Large);
        assert_eq!(rec.day_range, 100.0);
        assert!((rec.ib_ratio - 0.20).abs() < 1e-12);
        assert_eq!(rec.index, "NIFTY_50");
        assert_eq!(rec.date, d);
    }

    #[test]
    fn session_without_ib_bars_is_skipped() {
        let d = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        let bars = vec![bar(d, 13, 0, 1.0, 2.0, 0.5, 1.5)];
        assert!(SessionClassifier::default().classify(d, "X", &bars).is_none());
    }

    #[test]
    fn new_validates_components() {
        let bad = DayTypeThresholds {
            narrow_ib: -0.1,
            ..DayTypeThresholds::default()
        };
        assert!(SessionClassifier::new(SessionWindow::nse(), IbSizeBands::default(), bad).is_err());
    }

    #[test]
    fn deserialize_validates_components() {
        let mut value = serde_json::to_value(SessionClassifier::default()).unwrap();
        let back: SessionClassifier = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(back, SessionClassifier::default());

        value["ib_bands"]["small_below"] = serde_json::json!(5.0);
        value["ib_bands"]["medium_up_to"] = serde_json::json!(1.0);
        let err = serde_json::from_value::<SessionClassifier>(value).unwrap_err();
        assert!(err.to_string().contains("IB size bands inverted"));
    }
}
