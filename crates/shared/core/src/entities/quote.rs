use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::values::{MarketId, TokenId};

/// Top of book for one outcome token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub bid: Decimal,
    pub ask: Decimal,
    pub midpoint: Decimal,
    pub spread: Decimal,
    pub volume: Decimal,
    /// Independently known liquidity; estimated from volume when absent
    pub liquidity: Option<Decimal>,
    pub last_price: Option<Decimal>,
}

impl Quote {
    /// Build a quote from bid/ask, deriving midpoint and spread
    pub fn new(bid: Decimal, ask: Decimal, volume: Decimal) -> Self {
        Self {
            bid,
            ask,
            midpoint: (bid + ask) / Decimal::TWO,
            spread: ask - bid,
            volume,
            liquidity: None,
            last_price: None,
        }
    }

    pub fn with_liquidity(mut self, liquidity: Decimal) -> Self {
        self.liquidity = Some(liquidity);
        self
    }

    pub fn with_last_price(mut self, last_price: Decimal) -> Self {
        self.last_price = Some(last_price);
        self
    }

    /// Conservative quote used when live data is unavailable
    pub fn fallback() -> Self {
        Self::new(dec!(0.45), dec!(0.55), Decimal::ONE)
    }
}

/// Market snapshot returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    pub market_id: MarketId,
    pub token_id: TokenId,
    pub bid: Decimal,
    pub ask: Decimal,
    pub midpoint: Decimal,
    pub spread: Decimal,
    pub volume: Decimal,
    pub last_price: Option<Decimal>,
    /// True when built from the fallback quote rather than live data
    pub is_fallback: bool,
}

impl MarketState {
    pub fn from_quote(
        market_id: impl Into<MarketId>,
        token_id: impl Into<TokenId>,
        quote: &Quote,
        is_fallback: bool,
    ) -> Self {
        Self {
            market_id: market_id.into(),
            token_id: token_id.into(),
            bid: quote.bid,
            ask: quote.ask,
            midpoint: quote.midpoint,
            spread: quote.spread,
            volume: quote.volume,
            last_price: quote.last_price,
            is_fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_fields() {
        let quote = Quote::new(dec!(0.40), dec!(0.44), dec!(500));
        assert_eq!(quote.midpoint, dec!(0.42));
        assert_eq!(quote.spread, dec!(0.04));
    }

    #[test]
    fn test_fallback_quote() {
        let quote = Quote::fallback();
        assert_eq!(quote.bid, dec!(0.45));
        assert_eq!(quote.ask, dec!(0.55));
        assert_eq!(quote.midpoint, dec!(0.50));
        assert_eq!(quote.volume, Decimal::ONE);
    }
}
