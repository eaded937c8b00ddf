//! Day-type and IB-size labels.
//!
//! Both enums serialize as their human-readable labels ("Trend Day",
//! "Small", ...) so persisted tables stay readable by any downstream tool.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The six Market Profile day types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DayType {
    #[serde(rename = "Non-trend Day")]
    NonTrend,
    #[serde(rename = "Normal Day")]
    Normal,
    #[serde(rename = "Normal Variation Day")]
    NormalVariation,
    #[serde(rename = "Neutral Center Day")]
    NeutralCenter,
    #[serde(rename = "Neutral Extreme Day")]
    NeutralExtreme,
    #[serde(rename = "Trend Day")]
    Trend,
}

impl DayType {
    /// All day types in report column order.
    pub const ALL: [DayType; 6] = [
        DayType::NonTrend,
        DayType::Normal,
        DayType::NormalVariation,
        DayType::NeutralCenter,
        DayType::NeutralExtreme,
        DayType::Trend,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::NonTrend => "Non-trend Day",
            Self::Normal => "Normal Day",
            Self::NormalVariation => "Normal Variation Day",
            Self::NeutralCenter => "Neutral Center Day",
            Self::NeutralExtreme => "Neutral Extreme Day",
            Self::Trend => "Trend Day",
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DayType {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        DayType::ALL
            .into_iter()
            .find(|dt| dt.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

/// Initial Balance size relative to the opening price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IbSize {
    Small,
    Medium,
    Large,
}

impl IbSize {
    pub const ALL: [IbSize; 3] = [IbSize::Small, IbSize::Medium, IbSize::Large];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
        }
    }
}

impl fmt::Display for IbSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for IbSize {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        IbSize::ALL
            .into_iter()
            .find(|size| size.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

/// A label string that matches no known day type or IB size.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown label: '{0}'")]
pub struct UnknownLabel(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_back() {
        for dt in DayType::ALL {
            assert_eq!(dt.label().parse::<DayType>().unwrap(), dt);
        }
        for size in IbSize::ALL {
            assert_eq!(size.label().parse::<IbSize>().unwrap(), size);
        }
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(" trend day ".parse::<DayType>().unwrap(), DayType::Trend);
        assert_eq!("LARGE".parse::<IbSize>().unwrap(), IbSize::Large);
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = "Double Distribution Day".parse::<DayType>().unwrap_err();
        assert_eq!(err, UnknownLabel("Double Distribution Day".into()));
    }

    #[test]
    fn serializes_as_label() {
        let json = serde_json::to_string(&DayType::NeutralExtreme).unwrap();
        assert_eq!(json, "\"Neutral Extreme Day\"");
        let back: DayType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DayType::NeutralExtreme);
    }

    #[test]
    fn report_order_starts_with_non_trend() {
        assert_eq!(DayType::ALL[0], DayType::NonTrend);
        assert_eq!(DayType::ALL[5], DayType::Trend);
    }
}
