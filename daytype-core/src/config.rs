//! Session window configuration and configuration errors.
//!
//! All structural validation happens here, at construction time. Once a
//! `SessionWindow` exists, per-day extraction never fails on account of the
//! configuration.

use chrono::{Duration, FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structurally invalid configuration. Raised once, never per day.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("session close {close} must be after session open {open}")]
    CloseNotAfterOpen { open: NaiveTime, close: NaiveTime },

    #[error("IB cutoff {cutoff} must be after session open {open}")]
    IbCutoffNotAfterOpen { open: NaiveTime, cutoff: NaiveTime },

    #[error("IB cutoff {cutoff} falls after session close {close}")]
    IbCutoffAfterClose { cutoff: NaiveTime, close: NaiveTime },

    #[error("IB duration must be positive, got {minutes} minutes")]
    NonPositiveIbDuration { minutes: i64 },

    #[error("threshold '{name}' must be finite, got {value}")]
    NonFiniteThreshold { name: &'static str, value: f64 },

    #[error("ratio threshold '{name}' must lie within [0, 1], got {value}")]
    RatioOutOfRange { name: &'static str, value: f64 },

    #[error("IB size bands inverted: small_below {small_below} exceeds medium_up_to {medium_up_to}")]
    IbBandsInverted { small_below: f64, medium_up_to: f64 },

    #[error("invalid time '{0}': expected HH:MM or HH:MM:SS")]
    InvalidTime(String),

    #[error("invalid UTC offset '{0}': expected +HH:MM or -HH:MM")]
    InvalidUtcOffset(String),

    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("start date {start} is after end date {end}")]
    InvertedDateRange { start: String, end: String },
}

/// Trading session hours and the Initial Balance cutoff, in exchange time.
///
/// Invariant: `open < ib_cutoff <= close`. Deserialization goes through
/// [`SessionWindow::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSessionWindow")]
pub struct SessionWindow {
    open: NaiveTime,
    close: NaiveTime,
    ib_cutoff: NaiveTime,
}

#[derive(Deserialize)]
struct RawSessionWindow {
    open: NaiveTime,
    close: NaiveTime,
    ib_cutoff: NaiveTime,
}

impl TryFrom<RawSessionWindow> for SessionWindow {
    type Error = ConfigError;

    fn try_from(raw: RawSessionWindow) -> Result<Self, Self::Error> {
        Self::new(raw.open, raw.close, raw.ib_cutoff)
    }
}

impl SessionWindow {
    pub fn new(open: NaiveTime, close: NaiveTime, ib_cutoff: NaiveTime) -> Result<Self, ConfigError> {
        if close <= open {
            return Err(ConfigError::CloseNotAfterOpen { open, close });
        }
        if ib_cutoff <= open {
            return Err(ConfigError::IbCutoffNotAfterOpen { open, cutoff: ib_cutoff });
        }
        if ib_cutoff > close {
            return Err(ConfigError::IbCutoffAfterClose { cutoff: ib_cutoff, close });
        }
        Ok(Self { open, close, ib_cutoff })
    }

    /// Build a window whose IB ends a fixed number of minutes after the open.
    pub fn with_ib_minutes(open: NaiveTime, close: NaiveTime, ib_minutes: i64) -> Result<Self, ConfigError> {
        if ib_minutes <= 0 {
            return Err(ConfigError::NonPositiveIbDuration { minutes: ib_minutes });
        }
        let (cutoff, wrapped) = open.overflowing_add_signed(Duration::minutes(ib_minutes));
        if wrapped != 0 {
            // Past midnight is necessarily past the close.
            return Err(ConfigError::IbCutoffAfterClose { cutoff, close });
        }
        Self::new(open, close, cutoff)
    }

    /// NSE cash session: 09:15-15:30 with a one-hour IB ending 10:15.
    pub fn nse() -> Self {
        Self {
            open: hm(9, 15),
            close: hm(15, 30),
            ib_cutoff: hm(10, 15),
        }
    }

    pub fn open(&self) -> NaiveTime {
        self.open
    }

    pub fn close(&self) -> NaiveTime {
        self.close
    }

    pub fn ib_cutoff(&self) -> NaiveTime {
        self.ib_cutoff
    }

    /// True if `t` lies within `[open, close]`.
    pub fn in_session(&self, t: NaiveTime) -> bool {
        t >= self.open && t <= self.close
    }

    /// True if `t` lies within `[open, ib_cutoff]`.
    pub fn in_initial_balance(&self, t: NaiveTime) -> bool {
        t >= self.open && t <= self.ib_cutoff
    }
}

impl Default for SessionWindow {
    fn default() -> Self {
        Self::nse()
    }
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_time(s: &str) -> Result<NaiveTime, ConfigError> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| ConfigError::InvalidTime(s.to_string()))
}

/// Parse a UTC offset such as `+05:30`, `-04:00` or `Z`.
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset, ConfigError> {
    let s = s.trim();
    let err = || ConfigError::InvalidUtcOffset(s.to_string());
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(err);
    }
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(err()),
    };
    let (h, m) = rest.split_once(':').ok_or_else(err)?;
    let hours: i32 = h.parse().map_err(|_| err())?;
    let minutes: i32 = m.parse().map_err(|_| err())?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(err());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nse_window_matches_reference_hours() {
        let w = SessionWindow::nse();
        assert_eq!(w.open(), hm(9, 15));
        assert_eq!(w.close(), hm(15, 30));
        assert_eq!(w.ib_cutoff(), hm(10, 15));
    }

    #[test]
    fn ib_minutes_builds_cutoff() {
        let w = SessionWindow::with_ib_minutes(hm(9, 30), hm(16, 0), 60).unwrap();
        assert_eq!(w.ib_cutoff(), hm(10, 30));
    }

    #[test]
    fn rejects_cutoff_before_open() {
        let err = SessionWindow::new(hm(9, 15), hm(15, 30), hm(9, 0)).unwrap_err();
        assert!(matches!(err, ConfigError::IbCutoffNotAfterOpen { .. }));
    }

    #[test]
    fn rejects_cutoff_equal_to_open() {
        let err = SessionWindow::new(hm(9, 15), hm(15, 30), hm(9, 15)).unwrap_err();
        assert!(matches!(err, ConfigError::IbCutoffNotAfterOpen { .. }));
    }

    #[test]
    fn rejects_cutoff_after_close() {
        let err = SessionWindow::new(hm(9, 15), hm(15, 30), hm(16, 0)).unwrap_err();
        assert!(matches!(err, ConfigError::IbCutoffAfterClose { .. }));
    }

    #[test]
    fn rejects_close_before_open() {
        let err = SessionWindow::new(hm(15, 30), hm(9, 15), hm(10, 15)).unwrap_err();
        assert!(matches!(err, ConfigError::CloseNotAfterOpen { .. }));
    }

    #[test]
    fn rejects_non_positive_ib_minutes() {
        let err = SessionWindow::with_ib_minutes(hm(9, 15), hm(15, 30), 0).unwrap_err();
        assert_eq!(err, ConfigError::NonPositiveIbDuration { minutes: 0 });
    }

    #[test]
    fn rejects_ib_minutes_wrapping_midnight() {
        let err = SessionWindow::with_ib_minutes(hm(23, 0), hm(23, 59), 120).unwrap_err();
        assert!(matches!(err, ConfigError::IbCutoffAfterClose { .. }));
    }

    #[test]
    fn deserialize_runs_window_validation() {
        let inverted = r#"{"open":"10:00:00","close":"09:00:00","ib_cutoff":"08:00:00"}"#;
        let err = serde_json::from_str::<SessionWindow>(inverted).unwrap_err();
        assert!(err.to_string().contains("must be after session open"));

        let json = serde_json::to_string(&SessionWindow::nse()).unwrap();
        let back: SessionWindow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SessionWindow::nse());
    }

    #[test]
    fn session_bounds_are_inclusive() {
        let w = SessionWindow::nse();
        assert!(w.in_session(hm(9, 15)));
        assert!(w.in_session(hm(15, 30)));
        assert!(!w.in_session(hm(9, 14)));
        assert!(w.in_initial_balance(hm(10, 15)));
        assert!(!w.in_initial_balance(hm(10, 16)));
    }

    #[test]
    fn parses_times_with_and_without_seconds() {
        assert_eq!(parse_time("09:15").unwrap(), hm(9, 15));
        assert_eq!(parse_time(" 15:30:00 ").unwrap(), hm(15, 30));
        assert!(matches!(parse_time("9.15"), Err(ConfigError::InvalidTime(_))));
    }

    #[test]
    fn parses_utc_offsets() {
        assert_eq!(parse_utc_offset("+05:30").unwrap().local_minus_utc(), 19_800);
        assert_eq!(parse_utc_offset("-04:00").unwrap().local_minus_utc(), -14_400);
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert!(parse_utc_offset("05:30").is_err());
        assert!(parse_utc_offset("+25:00").is_err());
    }
}
