//! Daily trade-count risk gate.

/// Pure predicate consulted before every entry.
pub fn allowed_to_trade(trades_today: u32, max_per_day: u32) -> bool {
    trades_today < max_per_day
}
