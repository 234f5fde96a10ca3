//! Signal extraction and scoring.
//!
//! Three raw statistics are derived from a price window, then combined
//! linearly into a single score:
//! - trend: fractional return against the 5th-from-last close
//! - momentum: mean of the last 5 first differences
//! - volatility: sample standard deviation of the last 10 fractional returns
//!
//! No smoothing or winsorizing is applied; the statistics are deliberately raw.

use crate::domain::error::PapertraderError;
use crate::domain::window::{MIN_WINDOW_LEN, PriceTick};

/// Number of closes spanned by the trend return (reference is the 5th from last).
pub const TREND_SPAN: usize = 5;
/// Number of first differences averaged for momentum.
pub const MOMENTUM_DIFFS: usize = 5;
/// Maximum number of fractional returns entering the volatility estimate.
pub const VOLATILITY_RETURNS: usize = 10;

/// Per-cycle derived statistics. Immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalSet {
    pub trend: f64,
    pub momentum: f64,
    pub volatility: f64,
}

/// Global linear model weights. The volatility weight is subtracted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub trend: f64,
    pub momentum: f64,
    pub volatility: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            trend: 0.5,
            momentum: 0.3,
            volatility: 0.4,
        }
    }
}

/// Compute the signal set for a window of at least [`MIN_WINDOW_LEN`] closes.
///
/// A zero close in any denominator is surfaced as
/// [`PapertraderError::InvalidSignal`], never coerced to zero or infinity.
pub fn compute_signals(ticker: &str, window: &[PriceTick]) -> Result<SignalSet, PapertraderError> {
    let n = window.len();
    if n < MIN_WINDOW_LEN {
        return Err(PapertraderError::InsufficientData {
            ticker: ticker.to_string(),
            samples: n,
            minimum: MIN_WINDOW_LEN,
        });
    }

    let closes: Vec<f64> = window.iter().map(|t| t.close).collect();

    let reference = closes[n - TREND_SPAN];
    if reference == 0.0 {
        return Err(PapertraderError::InvalidSignal {
            ticker: ticker.to_string(),
            reason: format!("zero reference close {} samples back", TREND_SPAN),
        });
    }
    let trend = (closes[n - 1] - reference) / reference;

    let momentum = (n - MOMENTUM_DIFFS..n)
        .map(|i| closes[i] - closes[i - 1])
        .sum::<f64>()
        / MOMENTUM_DIFFS as f64;

    let volatility = fractional_return_stddev(ticker, &closes)?;

    Ok(SignalSet {
        trend,
        momentum,
        volatility,
    })
}

/// Sample standard deviation (n-1 denominator) of the last up-to-10
/// fractional returns. A 10-close window yields 9 returns.
fn fractional_return_stddev(ticker: &str, closes: &[f64]) -> Result<f64, PapertraderError> {
    let n = closes.len();
    let count = VOLATILITY_RETURNS.min(n - 1);

    let mut returns = Vec::with_capacity(count);
    for i in n - count..n {
        let prev = closes[i - 1];
        if prev == 0.0 {
            return Err(PapertraderError::InvalidSignal {
                ticker: ticker.to_string(),
                reason: "zero close inside volatility window".to_string(),
            });
        }
        returns.push((closes[i] - prev) / prev);
    }

    let mean = returns.iter().sum::<f64>() / count as f64;
    let variance = returns
        .iter()
        .map(|r| {
            let diff = r - mean;
            diff * diff
        })
        .sum::<f64>()
        / (count - 1) as f64;

    Ok(variance.sqrt())
}

/// Linear combination of signals into a scalar score. Sign and magnitude
/// are both meaningful; no bounds.
pub fn score_signals(signals: &SignalSet, weights: &ScoreWeights) -> f64 {
    weights.trend * signals.trend + weights.momentum * signals.momentum
        - weights.volatility * signals.volatility
}
