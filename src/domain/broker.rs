//! Simulated cash-and-position ledger with transaction-cost modeling.
//!
//! One position per ticker, no scaling in or out. Buy and sell report
//! explicit outcomes: a failed sell is distinguishable from a zero-PnL fill.

use std::collections::HashMap;

/// Cost model applied to every fill. Percentages are fractions
/// (0.0005 = 5 basis points), not percent values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub commission_per_trade: f64,
    pub spread_pct: f64,
    pub slippage_pct: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel {
            commission_per_trade: 0.0,
            spread_pct: 0.0005,
            slippage_pct: 0.0003,
        }
    }
}

/// An open position. `entry_price` is the cost-adjusted fill price.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub shares: f64,
    pub entry_price: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.shares
    }
}

/// Result of a buy attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum BuyOutcome {
    Filled {
        shares: f64,
        fill_price: f64,
        total_cost: f64,
    },
    InsufficientCash,
}

/// Result of a sell attempt. `NoPosition` is an explicit no-op signal,
/// never conflated with a fill whose PnL happens to be zero.
#[derive(Debug, Clone, PartialEq)]
pub enum SellOutcome {
    Filled {
        proceeds: f64,
        fill_price: f64,
        pnl: f64,
    },
    NoPosition,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone)]
pub struct Broker {
    pub cash: f64,
    pub starting_cash: f64,
    pub positions: HashMap<String, Position>,
    pub realized_pnl: f64,
    costs: CostModel,
}

impl Broker {
    pub fn new(starting_cash: f64, costs: CostModel) -> Self {
        Broker {
            cash: starting_cash,
            starting_cash,
            positions: HashMap::new(),
            realized_pnl: 0.0,
            costs,
        }
    }

    pub fn costs(&self) -> &CostModel {
        &self.costs
    }

    pub fn has_position(&self, ticker: &str) -> bool {
        self.positions.contains_key(ticker)
    }

    pub fn get_position(&self, ticker: &str) -> Option<&Position> {
        self.positions.get(ticker)
    }

    /// Half the spread plus slippage, against the trade direction.
    fn fill_price(&self, quoted: f64, side: Side) -> f64 {
        let adjustment = self.costs.spread_pct / 2.0 + self.costs.slippage_pct;
        match side {
            Side::Buy => quoted * (1.0 + adjustment),
            Side::Sell => quoted * (1.0 - adjustment),
        }
    }

    /// Buy `amount` of cash worth of the ticker at the cost-adjusted price.
    /// Fails without state change when `amount + commission` exceeds cash,
    /// so cash stays non-negative after any successful buy.
    pub fn buy(&mut self, ticker: &str, quoted_price: f64, amount: f64) -> BuyOutcome {
        let fill_price = self.fill_price(quoted_price, Side::Buy);
        let total_cost = amount + self.costs.commission_per_trade;

        if total_cost > self.cash {
            return BuyOutcome::InsufficientCash;
        }

        let shares = amount / fill_price;
        self.cash -= total_cost;
        self.positions.insert(
            ticker.to_string(),
            Position {
                shares,
                entry_price: fill_price,
            },
        );

        BuyOutcome::Filled {
            shares,
            fill_price,
            total_cost,
        }
    }

    /// Sell the full position at the cost-adjusted price. The position is
    /// removed atomically with crediting the proceeds.
    pub fn sell(&mut self, ticker: &str, quoted_price: f64) -> SellOutcome {
        let Some(position) = self.positions.remove(ticker) else {
            return SellOutcome::NoPosition;
        };

        let fill_price = self.fill_price(quoted_price, Side::Sell);
        let proceeds = position.shares * fill_price - self.costs.commission_per_trade;
        let pnl = proceeds - position.shares * position.entry_price;

        self.realized_pnl += pnl;
        self.cash += proceeds;

        SellOutcome::Filled {
            proceeds,
            fill_price,
            pnl,
        }
    }

    /// Cash plus marked position value. A ticker without a mark is valued
    /// at its entry price, never at zero.
    pub fn equity(&self, marks: &HashMap<String, f64>) -> f64 {
        let position_value: f64 = self
            .positions
            .iter()
            .map(|(ticker, pos)| {
                let price = marks.get(ticker).copied().unwrap_or(pos.entry_price);
                pos.market_value(price)
            })
            .sum();
        self.cash + position_value
    }

    /// Unrealized PnL over positions with a known mark; unmarked positions
    /// contribute nothing.
    pub fn unrealized_pnl(&self, marks: &HashMap<String, f64>) -> f64 {
        self.positions
            .iter()
            .filter_map(|(ticker, pos)| marks.get(ticker).map(|&price| pos.unrealized_pnl(price)))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_costs() -> CostModel {
        CostModel {
            commission_per_trade: 0.005,
            spread_pct: 0.0005,
            slippage_pct: 0.0003,
        }
    }

    fn free_costs() -> CostModel {
        CostModel {
            commission_per_trade: 0.0,
            spread_pct: 0.0,
            slippage_pct: 0.0,
        }
    }

    #[test]
    fn buy_reference_example() {
        let mut broker = Broker::new(10.0, reference_costs());

        let outcome = broker.buy("SPY", 100.0, 5.0);
        match outcome {
            BuyOutcome::Filled {
                shares,
                fill_price,
                total_cost,
            } => {
                let expected_fill = 100.0 * (1.0 + 0.00025 + 0.0003);
                assert!((fill_price - expected_fill).abs() < 1e-12);
                assert!((fill_price - 100.055).abs() < 1e-9);
                assert!((shares - 5.0 / 100.055).abs() < 1e-12);
                assert!((total_cost - 5.005).abs() < 1e-12);
            }
            BuyOutcome::InsufficientCash => panic!("expected fill"),
        }

        assert!((broker.cash - 4.995).abs() < 1e-12);
        let pos = broker.get_position("SPY").unwrap();
        assert!((pos.entry_price - 100.055).abs() < 1e-9);
    }

    #[test]
    fn buy_insufficient_cash_leaves_state_untouched() {
        let mut broker = Broker::new(10.0, reference_costs());

        let outcome = broker.buy("SPY", 100.0, 10.0); // 10.0 + commission > 10.0
        assert_eq!(outcome, BuyOutcome::InsufficientCash);
        assert!(!broker.has_position("SPY"));
        assert!((broker.cash - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cash_non_negative_after_maximal_buy() {
        let mut broker = Broker::new(10.0, free_costs());
        let outcome = broker.buy("SPY", 100.0, 10.0);
        assert!(matches!(outcome, BuyOutcome::Filled { .. }));
        assert!(broker.cash >= 0.0);
        assert!(broker.cash.abs() < f64::EPSILON);
    }

    #[test]
    fn sell_without_position_is_no_position() {
        let mut broker = Broker::new(10.0, reference_costs());
        assert_eq!(broker.sell("SPY", 100.0), SellOutcome::NoPosition);
        assert!((broker.cash - 10.0).abs() < f64::EPSILON);
        assert!((broker.realized_pnl - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sell_removes_position_and_second_sell_fails() {
        let mut broker = Broker::new(10.0, reference_costs());
        broker.buy("SPY", 100.0, 5.0);

        let first = broker.sell("SPY", 110.0);
        assert!(matches!(first, SellOutcome::Filled { .. }));
        assert!(!broker.has_position("SPY"));

        let second = broker.sell("SPY", 110.0);
        assert_eq!(second, SellOutcome::NoPosition);
    }

    #[test]
    fn zero_pnl_fill_is_distinguishable_from_no_position() {
        let mut broker = Broker::new(10.0, free_costs());
        broker.buy("SPY", 100.0, 5.0);

        let outcome = broker.sell("SPY", 100.0);
        match outcome {
            SellOutcome::Filled { pnl, .. } => assert!(pnl.abs() < 1e-12),
            SellOutcome::NoPosition => panic!("expected a fill"),
        }
    }

    #[test]
    fn round_trip_accumulates_realized_pnl() {
        let mut broker = Broker::new(100.0, free_costs());
        broker.buy("SPY", 100.0, 50.0);
        let outcome = broker.sell("SPY", 110.0);

        let SellOutcome::Filled { pnl, .. } = outcome else {
            panic!("expected a fill");
        };
        assert!((pnl - 5.0).abs() < 1e-12); // 0.5 shares * 10.0
        assert!((broker.realized_pnl - pnl).abs() < f64::EPSILON);
        assert!((broker.cash - 105.0).abs() < 1e-12);
    }

    #[test]
    fn costs_reduce_round_trip_pnl() {
        let mut broker = Broker::new(100.0, reference_costs());
        broker.buy("SPY", 100.0, 50.0);
        let outcome = broker.sell("SPY", 100.0);

        let SellOutcome::Filled { pnl, .. } = outcome else {
            panic!("expected a fill");
        };
        // Same quoted price on both legs: spread, slippage and two
        // commissions make this strictly negative.
        assert!(pnl < 0.0);
        assert!(broker.cash < 100.0);
    }

    #[test]
    fn equity_marks_positions_and_falls_back_to_entry() {
        let mut broker = Broker::new(100.0, free_costs());
        broker.buy("SPY", 100.0, 50.0);
        broker.buy("QQQ", 200.0, 20.0);

        // Only SPY is marked; QQQ is valued at entry, not zero.
        let mut marks = HashMap::new();
        marks.insert("SPY".to_string(), 110.0);

        let equity = broker.equity(&marks);
        let expected = 30.0 + 0.5 * 110.0 + 0.1 * 200.0;
        assert!((equity - expected).abs() < 1e-12);
    }

    #[test]
    fn equity_with_no_positions_is_cash() {
        let broker = Broker::new(42.0, reference_costs());
        assert!((broker.equity(&HashMap::new()) - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unrealized_pnl_skips_unmarked_positions() {
        let mut broker = Broker::new(100.0, free_costs());
        broker.buy("SPY", 100.0, 50.0);
        broker.buy("QQQ", 200.0, 20.0);

        let mut marks = HashMap::new();
        marks.insert("SPY".to_string(), 120.0);

        let pnl = broker.unrealized_pnl(&marks);
        assert!((pnl - 0.5 * 20.0).abs() < 1e-12);
    }

    #[test]
    fn sell_fill_price_is_discounted() {
        let mut broker = Broker::new(100.0, reference_costs());
        broker.buy("SPY", 100.0, 50.0);

        let SellOutcome::Filled { fill_price, .. } = broker.sell("SPY", 100.0) else {
            panic!("expected a fill");
        };
        let expected = 100.0 * (1.0 - 0.00025 - 0.0003);
        assert!((fill_price - expected).abs() < 1e-12);
    }
}
