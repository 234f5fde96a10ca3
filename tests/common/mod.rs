#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use papertrader::domain::engine::DecisionRecord;
use papertrader::domain::error::PapertraderError;
use papertrader::domain::window::PriceTick;
use papertrader::ports::data_port::MarketDataPort;
use papertrader::ports::log_port::DecisionLogPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceTick>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_ticks(mut self, ticker: &str, ticks: Vec<PriceTick>) -> Self {
        self.data.insert(ticker.to_string(), ticks);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockDataPort {
    fn fetch_window(&self, ticker: &str) -> Result<Vec<PriceTick>, PapertraderError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(PapertraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(ticker).cloned().unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, PapertraderError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

/// Log port that keeps records in memory.
#[derive(Default)]
pub struct MemoryLogPort {
    pub records: Vec<DecisionRecord>,
}

impl DecisionLogPort for MemoryLogPort {
    fn record(&mut self, record: &DecisionRecord) -> Result<(), PapertraderError> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Mid-session starting timestamp on a weekday (Monday 2024-01-15).
pub fn session_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

/// One tick per minute from `start`.
pub fn ticks_from(start: NaiveDateTime, closes: &[f64]) -> Vec<PriceTick> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceTick {
            timestamp: start + TimeDelta::minutes(i as i64),
            close,
        })
        .collect()
}

pub fn minute_ticks(closes: &[f64]) -> Vec<PriceTick> {
    ticks_from(session_start(), closes)
}

/// Flat warmup followed by a linear rally.
pub fn flat_then_rally(flat: usize, rally: usize) -> Vec<PriceTick> {
    let mut closes = vec![100.0; flat];
    closes.extend((1..=rally).map(|i| 100.0 + i as f64));
    minute_ticks(&closes)
}
