//! The day-type rule table.
//!
//! Rules are evaluated top to bottom and the first match wins. Order carries
//! precedence: two-sided extension is checked before IB width, so a wide IB
//! broken on both sides reads as Neutral rather than Non-trend; the Trend
//! rule only sees days the wide-IB rules have already passed over.
//!
//! | # | Condition                                                         | Day type         |
//! |---|-------------------------------------------------------------------|------------------|
//! | 1 | both sides extended, close within `near_mid` of the midpoint      | Neutral Center   |
//! | 2 | both sides extended, close within `near_extreme` of an extreme    | Neutral Extreme  |
//! | 3 | `ib_ratio >= very_wide_ib`, no extension                          | Non-trend        |
//! | 4 | `ib_ratio >= wide_ib`, no extension                               | Normal           |
//! | 5 | `ib_ratio >= wide_ib`, one side extended                          | Normal Variation |
//! | 6 | `ib_ratio <= narrow_ib`, one side extended, close near an extreme | Trend            |
//! | 7 | both sides extended                                               | Neutral Center   |
//! | 8 | one side extended                                                 | Normal Variation |
//! | 9 | anything else                                                     | Non-trend        |
//!
//! One-sided days with `narrow_ib < ib_ratio < wide_ib` never reach a Trend
//! label; they land on rule 8 whatever the close does.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ConfigError;
use crate::domain::DayType;
use crate::metrics::SessionMetrics;

/// Tunable thresholds for the rule table. All are fractions of the day range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayTypeThresholds {
    /// IB occupies at least this share of the day: Non-trend candidate.
    pub very_wide_ib: f64,
    /// IB occupies at least this share of the day: wide IB.
    pub wide_ib: f64,
    /// IB occupies at most this share of the day: Trend candidate.
    pub narrow_ib: f64,
    /// Close within this distance of the midpoint counts as "at the center".
    pub near_mid: f64,
    /// Close within this distance of the high or low counts as "at an extreme".
    pub near_extreme: f64,
}

impl DayTypeThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("very_wide_ib", self.very_wide_ib),
            ("wide_ib", self.wide_ib),
            ("narrow_ib", self.narrow_ib),
            ("near_mid", self.near_mid),
            ("near_extreme", self.near_extreme),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteThreshold { name, value });
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RatioOutOfRange { name, value });
            }
        }
        Ok(())
    }
}

impl Default for DayTypeThresholds {
    fn default() -> Self {
        Self {
            very_wide_ib: 0.80,
            wide_ib: 0.50,
            narrow_ib: 0.25,
            near_mid: 0.30,
            near_extreme: 0.15,
        }
    }
}

/// One row of the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayTypeRule {
    NeutralCenter,
    NeutralExtreme,
    NonTrend,
    Normal,
    NormalVariation,
    Trend,
    TwoSidedFallback,
    OneSidedFallback,
    NoExtensionFallback,
}

/// The rule table in evaluation order.
pub const RULE_TABLE: [DayTypeRule; 9] = [
    DayTypeRule::NeutralCenter,
    DayTypeRule::NeutralExtreme,
    DayTypeRule::NonTrend,
    DayTypeRule::Normal,
    DayTypeRule::NormalVariation,
    DayTypeRule::Trend,
    DayTypeRule::TwoSidedFallback,
    DayTypeRule::OneSidedFallback,
    DayTypeRule::NoExtensionFallback,
];

impl DayTypeRule {
    /// 1-based position in [`RULE_TABLE`].
    pub fn order(&self) -> usize {
        match self {
            Self::NeutralCenter => 1,
            Self::NeutralExtreme => 2,
            Self::NonTrend => 3,
            Self::Normal => 4,
            Self::NormalVariation => 5,
            Self::Trend => 6,
            Self::TwoSidedFallback => 7,
            Self::OneSidedFallback => 8,
            Self::NoExtensionFallback => 9,
        }
    }

    /// The label this rule assigns.
    pub fn day_type(&self) -> DayType {
        match self {
            Self::NeutralCenter | Self::TwoSidedFallback => DayType::NeutralCenter,
            Self::NeutralExtreme => DayType::NeutralExtreme,
            Self::NonTrend | Self::NoExtensionFallback => DayType::NonTrend,
            Self::Normal => DayType::Normal,
            Self::NormalVariation | Self::OneSidedFallback => DayType::NormalVariation,
            Self::Trend => DayType::Trend,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::NeutralCenter => "both sides extended, close near the midpoint",
            Self::NeutralExtreme => "both sides extended, close near an extreme",
            Self::NonTrend => "very wide IB, no range extension",
            Self::Normal => "wide IB, no range extension",
            Self::NormalVariation => "wide IB, one-sided range extension",
            Self::Trend => "narrow IB, one-sided extension, close near an extreme",
            Self::TwoSidedFallback => "both sides extended (fallback)",
            Self::OneSidedFallback => "one-sided range extension (fallback)",
            Self::NoExtensionFallback => "no other rule matched (fallback)",
        }
    }

    /// Whether this rule's condition holds, ignoring earlier rules.
    pub fn matches(&self, m: &SessionMetrics, t: &DayTypeThresholds) -> bool {
        let close_near_extreme = m.close_dist_from_extreme <= t.near_extreme;
        match self {
            Self::NeutralCenter => m.two_sided_extension() && m.close_pos_mid <= t.near_mid,
            Self::NeutralExtreme => m.two_sided_extension() && close_near_extreme,
            Self::NonTrend => m.ib_ratio >= t.very_wide_ib && m.no_extension(),
            Self::Normal => m.ib_ratio >= t.wide_ib && m.no_extension(),
            Self::NormalVariation => m.ib_ratio >= t.wide_ib && m.one_sided_extension(),
            Self::Trend => {
                m.ib_ratio <= t.narrow_ib && m.one_sided_extension() && close_near_extreme
            }
            Self::TwoSidedFallback => m.two_sided_extension(),
            Self::OneSidedFallback => m.one_sided_extension(),
            Self::NoExtensionFallback => true,
        }
    }
}

impl fmt::Display for DayTypeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {}: {}", self.order(), self.description())
    }
}

/// A day-type label together with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub day_type: DayType,
    pub rule: DayTypeRule,
}

/// Classify a session and report which rule fired.
pub fn classify_day_type_explained(m: &SessionMetrics, t: &DayTypeThresholds) -> Classification {
    let rule = RULE_TABLE
        .iter()
        .copied()
        .find(|rule| rule.matches(m, t))
        .unwrap_or(DayTypeRule::NoExtensionFallback);
    Classification {
        day_type: rule.day_type(),
        rule,
    }
}

/// Classify a session into one of the six day types.
pub fn classify_day_type(m: &SessionMetrics, t: &DayTypeThresholds) -> DayType {
    classify_day_type_explained(m, t).day_type
}
