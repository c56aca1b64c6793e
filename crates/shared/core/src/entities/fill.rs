use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whether a fill added or removed liquidity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Liquidity {
    /// Resting order that was hit
    Maker,
    /// Aggressive order that crossed the spread
    Taker,
}

/// Execution of all or part of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub size: Decimal,
    pub price: Decimal,
    pub fees: Decimal,
    /// Per-unit price difference from the base quote
    pub slippage: Decimal,
    pub liquidity: Liquidity,
}

impl Fill {
    /// Filled notional
    pub fn notional(&self) -> Decimal {
        self.size * self.price
    }
}
