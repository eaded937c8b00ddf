//! Session metrics extraction.
//!
//! Turns one day's intraday bars into the handful of numbers the day-type
//! rules look at: Initial Balance range, full-day range, range-extension
//! flags and where the close sits inside the day's range.
//!
//! Extraction is a pure function of the bars and the session window. It
//! returns `None` when the day cannot be measured (no session bars, or no bar
//! inside the IB window); callers skip such days rather than treat them as
//! errors.

use serde::{Deserialize, Serialize};

use crate::config::SessionWindow;
use crate::domain::Bar;

/// Derived per-session measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub ib_high: f64,
    pub ib_low: f64,
    pub ib_range: f64,
    pub day_high: f64,
    pub day_low: f64,
    pub day_range: f64,
    pub open_price: f64,
    pub close_price: f64,
    /// Day high strictly above the IB high.
    pub re_up: bool,
    /// Day low strictly below the IB low.
    pub re_down: bool,
    /// IB range as a percentage of the opening price.
    pub ib_pct: f64,
    /// IB range / day range.
    pub ib_ratio: f64,
    /// |close - mid| / day range.
    pub close_pos_mid: f64,
    /// Distance from the close to the nearer extreme / day range.
    pub close_dist_from_extreme: f64,
}

impl SessionMetrics {
    /// Both sides of the IB were broken.
    pub fn two_sided_extension(&self) -> bool {
        self.re_up && self.re_down
    }

    /// Exactly one side of the IB was broken.
    pub fn one_sided_extension(&self) -> bool {
        self.re_up ^ self.re_down
    }

    /// Neither side of the IB was broken.
    pub fn no_extension(&self) -> bool {
        !self.re_up && !self.re_down
    }
}

/// Extract session metrics from one day's bars.
///
/// Bars outside `[open, close]` are discarded first. The bars are expected
/// in time order with unique timestamps; the close is taken from the last
/// session bar.
pub fn extract(bars: &[Bar], window: &SessionWindow) -> Option<SessionMetrics> {
    let session: Vec<&Bar> = bars.iter().filter(|b| window.in_session(b.time())).collect();
    let first = *session.first()?;
    let last = *session.last()?;

    let (ib_high, ib_low) = high_low(
        session
            .iter()
            .copied()
            .filter(|b| window.in_initial_balance(b.time())),
    )?;
    let (day_high, day_low) = high_low(session.iter().copied())?;

    let ib_range = ib_high - ib_low;
    let day_range = day_high - day_low;

    let open_price = session
        .iter()
        .find(|b| b.time() == window.open())
        .map_or(first.open, |b| b.open);
    let close_price = last.close;

    let ib_pct = if open_price != 0.0 {
        ib_range / open_price * 100.0
    } else {
        0.0
    };

    let (ib_ratio, close_pos_mid, close_dist_from_extreme) = if day_range != 0.0 {
        let mid = (day_high + day_low) / 2.0;
        let nearest_extreme = (close_price - day_low)
            .abs()
            .min((close_price - day_high).abs());
        (
            ib_range / day_range,
            (close_price - mid).abs() / day_range,
            nearest_extreme / day_range,
        )
    } else {
        // A motionless day sits "far" from both extremes so it can never
        // read as a close pinned to one.
        (0.0, 0.0, 1.0)
    };

    Some(SessionMetrics {
        ib_high,
        ib_low,
        ib_range,
        day_high,
        day_low,
        day_range,
        open_price,
        close_price,
        re_up: day_high > ib_high,
        re_down: day_low < ib_low,
        ib_pct,
        ib_ratio,
        close_pos_mid,
        close_dist_from_extreme,
    })
}

/// Max high and min low over a set of bars, or `None` if it is empty.
fn high_low<'a>(bars: impl Iterator<Item = &'a Bar>) -> Option<(f64, f64)> {
    bars.fold(None, |acc, b| match acc {
        None => Some((b.high, b.low)),
        Some((h, l)) => Some((f64::max(h, b.high), f64::min(l, b.low))),
    })
}
