use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Analytics settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Notional balance the drawdown replay starts from
    pub starting_balance: Decimal,
    /// Annual risk-free rate subtracted in the Sharpe ratio
    pub risk_free_rate: Decimal,
    /// Return observations per year used to annualize
    pub periods_per_year: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            starting_balance: dec!(10000),
            risk_free_rate: Decimal::ZERO,
            periods_per_year: 252,
        }
    }
}
