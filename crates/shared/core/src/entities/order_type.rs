use serde::{Deserialize, Serialize};
use std::fmt;

/// Order types accepted by the prediction-market venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Execute immediately at the best available price
    Market,
    /// Execute at specified price or better, rest otherwise
    Limit,
    /// Good-till-cancelled limit order
    Gtc,
    /// Good-till-date limit order (requires an expiry)
    Gtd,
    /// Fill-or-kill
    Fok,
    /// Fill-and-kill (immediate-or-cancel)
    Fak,
}

impl OrderType {
    /// Market-type orders take liquidity immediately against the quote
    pub fn is_market_type(&self) -> bool {
        matches!(self, OrderType::Market | OrderType::Fok | OrderType::Fak)
    }

    /// Limit-type orders carry a mandatory price and may rest
    pub fn requires_price(&self) -> bool {
        !self.is_market_type()
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::Gtc => "GTC",
            OrderType::Gtd => "GTD",
            OrderType::Fok => "FOK",
            OrderType::Fak => "FAK",
        };
        write!(f, "{}", s)
    }
}
