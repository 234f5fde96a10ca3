//! Decision log port trait.

use crate::domain::engine::DecisionRecord;
use crate::domain::error::PapertraderError;

pub trait DecisionLogPort {
    fn record(&mut self, record: &DecisionRecord) -> Result<(), PapertraderError>;
}
