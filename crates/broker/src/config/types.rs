use meridian_analytics::AnalyticsConfig;
use meridian_core::RiskLimits;
use meridian_execution::ExecutionConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeridianConfig {
    pub paper: PaperConfig,
    pub live: LiveConfig,
    pub execution: ExecutionConfig,
    /// Limits given to a user's RiskConfig on first use
    pub risk: RiskLimits,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperConfig {
    /// Virtual cash every paper (and shadow) account starts with
    pub initial_balance: Decimal,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            initial_balance: dec!(10000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Cash basis when the venue reports no collateral
    pub initial_balance: Decimal,
    /// Deadline for each gateway call
    pub gateway_timeout_ms: u64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            initial_balance: Decimal::ZERO,
            gateway_timeout_ms: 10_000,
        }
    }
}

impl LiveConfig {
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }
}
