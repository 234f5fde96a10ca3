//! Historical replay driver.
//!
//! Feeds a tick series through the engine one cycle per tick, exactly as the
//! live loop would: fixed-size trailing windows, session-hours filtering, a
//! per-day trade counter, sequential single-writer state. Determinism comes
//! from the caller-supplied tick order; nothing here reorders or retries.

use chrono::NaiveDate;

use crate::domain::broker::Broker;
use crate::domain::calendar::MarketCalendar;
use crate::domain::engine::{CycleContext, Decision, DecisionRecord, Engine};
use crate::domain::error::PapertraderError;
use crate::domain::window::{PriceTick, MIN_WINDOW_LEN};

/// Outcome of replaying one instrument.
#[derive(Debug)]
pub struct BacktestResult {
    pub ticker: String,
    pub records: Vec<DecisionRecord>,
    pub trades: u32,
    pub final_equity: f64,
    pub realized_pnl: f64,
}

pub struct BacktestRunner {
    engine: Engine,
    broker: Broker,
    calendar: MarketCalendar,
}

impl BacktestRunner {
    pub fn new(engine: Engine, broker: Broker, calendar: MarketCalendar) -> Self {
        BacktestRunner {
            engine,
            broker,
            calendar,
        }
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Replay one instrument's tick series.
    ///
    /// Each tick closes one cycle; the window is the trailing
    /// [`MIN_WINDOW_LEN`] ticks ending at it. Ticks outside session hours
    /// are skipped, and the daily trade counter resets whenever the
    /// calendar date changes.
    pub fn run(
        &mut self,
        ticker: &str,
        ticks: &[PriceTick],
    ) -> Result<BacktestResult, PapertraderError> {
        if ticks.len() < MIN_WINDOW_LEN {
            return Err(PapertraderError::InsufficientData {
                ticker: ticker.to_string(),
                samples: ticks.len(),
                minimum: MIN_WINDOW_LEN,
            });
        }

        let mut records = Vec::new();
        let mut trades: u32 = 0;
        let mut trades_today: u32 = 0;
        let mut current_day: Option<NaiveDate> = None;

        for end in MIN_WINDOW_LEN..=ticks.len() {
            let window = &ticks[end - MIN_WINDOW_LEN..end];
            let now = window[MIN_WINDOW_LEN - 1].timestamp;

            let day = now.date();
            if current_day != Some(day) {
                current_day = Some(day);
                trades_today = 0;
            }

            if !self.calendar.is_open(now) {
                continue;
            }

            let ctx = CycleContext {
                now,
                near_market_close: self.calendar.is_near_close(now),
                trades_today,
            };

            let record = self.engine.process(ticker, window, &ctx, &mut self.broker)?;
            if record.decision != Decision::Hold {
                trades += 1;
            }
            // The daily allowance is consumed by entries; exits always run.
            if record.decision == Decision::Buy {
                trades_today += 1;
            }
            records.push(record);
        }

        let final_equity = records
            .last()
            .map(|r| r.equity)
            .unwrap_or(self.broker.cash);

        Ok(BacktestResult {
            ticker: ticker.to_string(),
            records,
            trades,
            final_equity,
            realized_pnl: self.broker.realized_pnl,
        })
    }
}
