//! Maker/taker fee schedule

use meridian_core::Liquidity;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

const BPS_DENOMINATOR: Decimal = dec!(10000);

/// Fee rates in basis points of filled notional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Fee for resting orders that get hit
    pub maker_bps: Decimal,
    /// Fee for orders that cross the spread
    pub taker_bps: Decimal,
}

impl FeeSchedule {
    pub fn new(maker_bps: Decimal, taker_bps: Decimal) -> Self {
        Self {
            maker_bps,
            taker_bps,
        }
    }

    /// Rate in basis points for a liquidity role
    pub fn rate_bps(&self, liquidity: Liquidity) -> Decimal {
        match liquidity {
            Liquidity::Maker => self.maker_bps,
            Liquidity::Taker => self.taker_bps,
        }
    }

    /// `size × price × bps / 10000`
    pub fn calculate_fee(&self, size: Decimal, price: Decimal, liquidity: Liquidity) -> Decimal {
        size * price * self.rate_bps(liquidity) / BPS_DENOMINATOR
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            maker_bps: Decimal::ZERO,
            taker_bps: dec!(60),
        }
    }
}
