//! Price window representation.
//!
//! A window is an ordered slice of ticks, most recent last. Signal
//! computation requires at least [`MIN_WINDOW_LEN`] closes; shorter windows
//! are skipped by the caller for the cycle rather than treated as errors.

use chrono::NaiveDateTime;

/// Minimum number of closes required for signal validity.
pub const MIN_WINDOW_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceTick {
    pub timestamp: NaiveDateTime,
    pub close: f64,
}

/// Latest close of a window, if any.
pub fn latest_close(window: &[PriceTick]) -> Option<f64> {
    window.last().map(|t| t.close)
}

/// Whether the window carries enough closes to compute signals.
pub fn has_enough_data(window: &[PriceTick]) -> bool {
    window.len() >= MIN_WINDOW_LEN
}
