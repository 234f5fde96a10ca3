//! Trading decision engine.
//!
//! Stateful per-ticker controller over a FLAT/LONG position lifecycle:
//! adaptive quantile thresholds over a rolling score history, regime-aware
//! entry, confidence-decay exit, and a market-close override. The engine is
//! a reducer from (window, context, prior state) to (decision, updated
//! state); it never blocks, retries, or reorders instruments.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

use crate::domain::broker::{Broker, BuyOutcome, SellOutcome};
use crate::domain::error::PapertraderError;
use crate::domain::history::BoundedHistory;
use crate::domain::regime::{self, Regime};
use crate::domain::risk;
use crate::domain::signal::{compute_signals, score_signals, ScoreWeights};
use crate::domain::window::{latest_close, PriceTick};

/// Engine tunables. All values are overridable from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub weights: ScoreWeights,
    pub history_capacity: usize,
    pub min_history_for_trade: usize,
    pub upper_quantile: f64,
    pub lower_quantile: f64,
    pub confidence_decay: f64,
    pub exit_decay_threshold: f64,
    pub overnight_hold_threshold: f64,
    pub position_pct: f64,
    pub max_trades_per_day: u32,
    /// Suppress entries while the regime is HIGH_VOL. Experimental
    /// refinement, so it is a switch rather than a hardcoded rule.
    pub regime_filter: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            weights: ScoreWeights::default(),
            history_capacity: 50,
            min_history_for_trade: 20,
            upper_quantile: 0.80,
            lower_quantile: 0.20,
            confidence_decay: 0.97,
            exit_decay_threshold: 0.25,
            overnight_hold_threshold: 0.6,
            position_pct: 0.20,
            max_trades_per_day: 5,
            regime_filter: true,
        }
    }
}

/// Decaying conviction attached to an open position. Created at entry,
/// destroyed by any exit path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confidence {
    pub current: f64,
    pub original: f64,
}

/// Rolling per-ticker engine state. Lives for the whole run.
#[derive(Debug, Clone)]
pub struct InstrumentState {
    pub score_history: BoundedHistory,
    pub volatility_history: BoundedHistory,
    pub confidence: Option<Confidence>,
}

impl InstrumentState {
    fn new(capacity: usize) -> Self {
        InstrumentState {
            score_history: BoundedHistory::new(capacity),
            volatility_history: BoundedHistory::new(capacity),
            confidence: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Decision::Buy => "BUY",
            Decision::Sell => "SELL",
            Decision::Hold => "HOLD",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    None,
    StrongUpSignal,
    ConfidenceDecayExit,
    MarketCloseExit,
    OvernightHold,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DecisionReason::None => "none",
            DecisionReason::StrongUpSignal => "strong_up_signal",
            DecisionReason::ConfidenceDecayExit => "confidence_decay_exit",
            DecisionReason::MarketCloseExit => "market_close_exit",
            DecisionReason::OvernightHold => "overnight_hold",
        };
        write!(f, "{}", label)
    }
}

fn serialize_timestamp<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&ts.format("%Y-%m-%d %H:%M:%S"))
}

/// Flat per-cycle record handed to the persistence collaborator. Optional
/// fields stay absent (empty CSV cells) when statistically undefined.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: NaiveDateTime,
    pub ticker: String,
    pub regime: Regime,
    pub trend: f64,
    pub momentum: f64,
    pub volatility: f64,
    pub score: f64,
    pub high_threshold: Option<f64>,
    pub low_threshold: Option<f64>,
    pub decision: Decision,
    pub decision_reason: DecisionReason,
    pub price: f64,
    pub cash: f64,
    pub realized_pnl: f64,
    pub equity: f64,
    pub entry_confidence_original: Option<f64>,
    pub current_confidence: Option<f64>,
    pub near_market_close: bool,
}

/// External facts the engine needs for one cycle of one ticker.
#[derive(Debug, Clone, Copy)]
pub struct CycleContext {
    pub now: NaiveDateTime,
    pub near_market_close: bool,
    pub trades_today: u32,
}

#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    states: HashMap<String, InstrumentState>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            config,
            states: HashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read access to a ticker's rolling state, if any cycles have run.
    pub fn state(&self, ticker: &str) -> Option<&InstrumentState> {
        self.states.get(ticker)
    }

    /// Run one decision cycle for one ticker.
    ///
    /// Branch priority: market-close override for an open position first
    /// (no decay applied there), then normal trading gated on history
    /// depth. The current score is appended to the history before the
    /// thresholds are derived, so it participates in its own thresholds.
    pub fn process(
        &mut self,
        ticker: &str,
        window: &[PriceTick],
        ctx: &CycleContext,
        broker: &mut Broker,
    ) -> Result<DecisionRecord, PapertraderError> {
        let config = self.config.clone();

        let Some(price) = latest_close(window) else {
            return Err(PapertraderError::InsufficientData {
                ticker: ticker.to_string(),
                samples: 0,
                minimum: crate::domain::window::MIN_WINDOW_LEN,
            });
        };

        let signals = compute_signals(ticker, window)?;
        let score = score_signals(&signals, &config.weights);

        let state = self
            .states
            .entry(ticker.to_string())
            .or_insert_with(|| InstrumentState::new(config.history_capacity));

        state.score_history.push(score);
        state.volatility_history.push(signals.volatility);

        let regime = regime::classify(&signals, &state.volatility_history);

        let is_long = broker.has_position(ticker);
        if is_long && state.confidence.is_none() {
            return Err(PapertraderError::InconsistentState {
                ticker: ticker.to_string(),
                reason: "open position without confidence state".to_string(),
            });
        }

        let mut decision = Decision::Hold;
        let mut reason = DecisionReason::None;
        let mut high_threshold = None;
        let mut low_threshold = None;
        let mut current_confidence = None;

        if ctx.near_market_close && is_long {
            // Market-close override: the overnight-hold ratio test alone
            // decides; confidence is not decayed on this branch.
            let conf = state.confidence.ok_or_else(|| {
                PapertraderError::InconsistentState {
                    ticker: ticker.to_string(),
                    reason: "open position without confidence state".to_string(),
                }
            })?;
            current_confidence = Some(conf.current);

            if conf.current.abs() < config.overnight_hold_threshold * conf.original.abs() {
                match broker.sell(ticker, price) {
                    SellOutcome::Filled { .. } => {
                        decision = Decision::Sell;
                        reason = DecisionReason::MarketCloseExit;
                        state.confidence = None;
                    }
                    SellOutcome::NoPosition => {
                        return Err(PapertraderError::InconsistentState {
                            ticker: ticker.to_string(),
                            reason: "position vanished during market-close exit".to_string(),
                        });
                    }
                }
            } else {
                reason = DecisionReason::OvernightHold;
            }
        } else if state.score_history.len() >= config.min_history_for_trade {
            high_threshold = state.score_history.percentile(config.upper_quantile);
            low_threshold = state.score_history.percentile(config.lower_quantile);

            let (Some(high), Some(low)) = (high_threshold, low_threshold) else {
                return Err(PapertraderError::InconsistentState {
                    ticker: ticker.to_string(),
                    reason: "thresholds undefined with sufficient history".to_string(),
                });
            };

            let strong_up = score > high && signals.trend > 0.0 && signals.momentum > 0.0;
            let strong_down = score < low && signals.trend < 0.0 && signals.momentum < 0.0;

            if !is_long {
                let regime_ok = !config.regime_filter || regime != Regime::HighVol;
                if strong_up
                    && regime_ok
                    && risk::allowed_to_trade(ctx.trades_today, config.max_trades_per_day)
                {
                    let amount = broker.cash * config.position_pct;
                    if let BuyOutcome::Filled { .. } = broker.buy(ticker, price, amount) {
                        state.confidence = Some(Confidence {
                            current: score,
                            original: score,
                        });
                        decision = Decision::Buy;
                        reason = DecisionReason::StrongUpSignal;
                    }
                }
            } else {
                let mut conf = state.confidence.ok_or_else(|| {
                    PapertraderError::InconsistentState {
                        ticker: ticker.to_string(),
                        reason: "open position without confidence state".to_string(),
                    }
                })?;

                // Unconditional per-cycle decay, compounding toward zero.
                conf.current *= config.confidence_decay;
                current_confidence = Some(conf.current);

                let decay_exit =
                    conf.current.abs() < config.exit_decay_threshold * conf.original.abs();

                if decay_exit || strong_down {
                    match broker.sell(ticker, price) {
                        SellOutcome::Filled { .. } => {
                            decision = Decision::Sell;
                            reason = DecisionReason::ConfidenceDecayExit;
                            state.confidence = None;
                        }
                        SellOutcome::NoPosition => {
                            return Err(PapertraderError::InconsistentState {
                                ticker: ticker.to_string(),
                                reason: "position vanished during decay exit".to_string(),
                            });
                        }
                    }
                } else {
                    state.confidence = Some(conf);
                }
            }
        }

        let mut marks = HashMap::new();
        marks.insert(ticker.to_string(), price);
        let equity = broker.equity(&marks);

        Ok(DecisionRecord {
            timestamp: ctx.now,
            ticker: ticker.to_string(),
            regime,
            trend: signals.trend,
            momentum: signals.momentum,
            volatility: signals.volatility,
            score,
            high_threshold,
            low_threshold,
            decision,
            decision_reason: reason,
            price,
            cash: broker.cash,
            realized_pnl: broker.realized_pnl,
            equity,
            entry_confidence_original: state.confidence.map(|c| c.original),
            current_confidence,
            near_market_close: ctx.near_market_close,
        })
    }
}
