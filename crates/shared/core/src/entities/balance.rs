use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cash projection for one (user, mode)
///
/// `total == available + in_orders + in_positions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// Cash not committed to resting orders
    pub available: Decimal,
    /// Cash reserved by resting BUY orders
    pub in_orders: Decimal,
    /// Mark-to-market value of open positions
    pub in_positions: Decimal,
    pub total: Decimal,
}

impl Balance {
    pub fn new(available: Decimal, in_orders: Decimal, in_positions: Decimal) -> Self {
        Self {
            available,
            in_orders,
            in_positions,
            total: available + in_orders + in_positions,
        }
    }
}
