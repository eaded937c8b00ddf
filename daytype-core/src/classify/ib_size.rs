//! IB-size banding.
//!
//! `ib_pct` (IB range as a percentage of the open) is split into three bands:
//! below `small_below` is Small, up to and including `medium_up_to` is
//! Medium, anything above is Large.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::domain::IbSize;

/// Band boundaries for [`classify_ib_size`], in percent of the opening price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IbSizeBands {
    pub small_below: f64,
    pub medium_up_to: f64,
}

impl IbSizeBands {
    pub const DEFAULT_SMALL_BELOW: f64 = 0.33;
    pub const DEFAULT_MEDIUM_UP_TO: f64 = 1.00;

    pub fn new(small_below: f64, medium_up_to: f64) -> Result<Self, ConfigError> {
        let bands = Self {
            small_below,
            medium_up_to,
        };
        bands.validate()?;
        Ok(bands)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("small_below", self.small_below),
            ("medium_up_to", self.medium_up_to),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteThreshold { name, value });
            }
        }
        if self.small_below > self.medium_up_to {
            return Err(ConfigError::IbBandsInverted {
                small_below: self.small_below,
                medium_up_to: self.medium_up_to,
            });
        }
        Ok(())
    }
}

impl Default for IbSizeBands {
    fn default() -> Self {
        Self {
            small_below: Self::DEFAULT_SMALL_BELOW,
            medium_up_to: Self::DEFAULT_MEDIUM_UP_TO,
        }
    }
}

/// Band an IB percentage. Total over every input; negatives land in Small.
pub fn classify_ib_size(ib_pct: f64, bands: &IbSizeBands) -> IbSize {
    if ib_pct < bands.small_below {
        IbSize::Small
    } else if ib_pct <= bands.medium_up_to {
        IbSize::Medium
    } else {
        IbSize::Large
    }
}
