//! CSV market data adapter.
//!
//! Reads `{ticker}.csv` files with a `timestamp,close` header from a base
//! directory. Rows are sorted by timestamp before being returned, so the
//! engine always sees a most-recent-last series.

use crate::domain::error::PapertraderError;
use crate::domain::window::PriceTick;
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDateTime;
use std::fs;
use std::path::PathBuf;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvDataAdapter {
    base_path: PathBuf,
}

impl CsvDataAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

impl MarketDataPort for CsvDataAdapter {
    fn fetch_window(&self, ticker: &str) -> Result<Vec<PriceTick>, PapertraderError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| PapertraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut ticks = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| PapertraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let timestamp_str = record.get(0).ok_or_else(|| PapertraderError::Data {
                reason: "missing timestamp column".into(),
            })?;
            let timestamp = NaiveDateTime::parse_from_str(timestamp_str, TIMESTAMP_FORMAT)
                .map_err(|e| PapertraderError::Data {
                    reason: format!("invalid timestamp format: {}", e),
                })?;

            let close: f64 = record
                .get(1)
                .ok_or_else(|| PapertraderError::Data {
                    reason: "missing close column".into(),
                })?
                .parse()
                .map_err(|e| PapertraderError::Data {
                    reason: format!("invalid close value: {}", e),
                })?;

            ticks.push(PriceTick { timestamp, close });
        }

        ticks.sort_by_key(|t| t.timestamp);
        Ok(ticks)
    }

    fn list_tickers(&self) -> Result<Vec<String>, PapertraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| PapertraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PapertraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(ticker) = name_str.strip_suffix(".csv") {
                tickers.push(ticker.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}
