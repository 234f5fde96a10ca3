//! Market data access port trait.

use crate::domain::error::PapertraderError;
use crate::domain::window::PriceTick;

pub trait MarketDataPort {
    /// Full tick series for a ticker, sorted by timestamp ascending.
    fn fetch_window(&self, ticker: &str) -> Result<Vec<PriceTick>, PapertraderError>;

    fn list_tickers(&self) -> Result<Vec<String>, PapertraderError>;
}
