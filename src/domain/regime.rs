//! Market regime classification.
//!
//! A regime is derived fresh each cycle from the current signal set and the
//! rolling volatility distribution. Checks run in a strict priority order;
//! the first match wins, so a volatility extreme always beats a trend label.

use serde::Serialize;
use std::fmt;

use crate::domain::history::BoundedHistory;
use crate::domain::signal::SignalSet;

/// Minimum volatility samples before classification is attempted.
pub const MIN_REGIME_HISTORY: usize = 20;

const HIGH_VOL_QUANTILE: f64 = 0.80;
const LOW_VOL_QUANTILE: f64 = 0.20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Regime {
    Unknown,
    HighVol,
    LowVol,
    TrendUp,
    TrendDown,
    Choppy,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Regime::Unknown => "UNKNOWN",
            Regime::HighVol => "HIGH_VOL",
            Regime::LowVol => "LOW_VOL",
            Regime::TrendUp => "TREND_UP",
            Regime::TrendDown => "TREND_DOWN",
            Regime::Choppy => "CHOPPY",
        };
        write!(f, "{}", label)
    }
}

/// Classify the current cycle's regime.
///
/// Cold start: fewer than [`MIN_REGIME_HISTORY`] volatility samples returns
/// `Unknown`. The volatility history is expected to already contain the
/// current cycle's volatility.
pub fn classify(signals: &SignalSet, volatility_history: &BoundedHistory) -> Regime {
    if volatility_history.len() < MIN_REGIME_HISTORY {
        return Regime::Unknown;
    }

    // len >= 20 so both percentiles exist
    let Some(high_vol) = volatility_history.percentile(HIGH_VOL_QUANTILE) else {
        return Regime::Unknown;
    };
    let Some(low_vol) = volatility_history.percentile(LOW_VOL_QUANTILE) else {
        return Regime::Unknown;
    };

    if signals.volatility >= high_vol {
        return Regime::HighVol;
    }
    if signals.volatility <= low_vol {
        return Regime::LowVol;
    }
    if signals.trend > 0.0 && signals.momentum > 0.0 {
        return Regime::TrendUp;
    }
    if signals.trend < 0.0 && signals.momentum < 0.0 {
        return Regime::TrendDown;
    }
    Regime::Choppy
}
