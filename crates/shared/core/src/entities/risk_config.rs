use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::values::UserId;

/// Numeric limits applied by the risk gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Orders allowed per (user, mode) in any trailing 60 seconds
    pub max_orders_per_minute: u32,
    /// Daily loss that trips the kill switch
    pub max_daily_loss: Decimal,
    /// Maximum value of a single order (size x reference price)
    pub max_position_size: Decimal,
    /// Maximum mark-to-market value across open positions
    pub max_total_exposure: Decimal,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_orders_per_minute: 10,
            max_daily_loss: dec!(100),
            max_position_size: dec!(1000),
            max_total_exposure: dec!(5000),
        }
    }
}

/// Partial update of [`RiskLimits`]; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskLimitsUpdate {
    pub max_orders_per_minute: Option<u32>,
    pub max_daily_loss: Option<Decimal>,
    pub max_position_size: Option<Decimal>,
    pub max_total_exposure: Option<Decimal>,
}

/// Kill switch state machine: INACTIVE -> ACTIVE -> INACTIVE (manual only)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KillSwitch {
    pub active: bool,
    pub reason: Option<String>,
    pub activated_at: Option<DateTime<Utc>>,
}

/// Per-account risk configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub user_id: UserId,
    pub limits: RiskLimits,
    pub kill_switch: KillSwitch,
    pub updated_at: DateTime<Utc>,
}

impl RiskConfig {
    /// New config with the given limits and the kill switch inactive
    pub fn new(user_id: impl Into<UserId>, limits: RiskLimits, timestamp: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            limits,
            kill_switch: KillSwitch::default(),
            updated_at: timestamp,
        }
    }

    /// Activate the kill switch. Returns false if it was already active,
    /// in which case reason and timestamp are left untouched.
    pub fn activate_kill_switch(&mut self, reason: impl Into<String>, timestamp: DateTime<Utc>) -> bool {
        if self.kill_switch.active {
            return false;
        }
        self.kill_switch = KillSwitch {
            active: true,
            reason: Some(reason.into()),
            activated_at: Some(timestamp),
        };
        self.updated_at = timestamp;
        true
    }

    /// Deactivate the kill switch. Returns false if it was not active.
    pub fn deactivate_kill_switch(&mut self, timestamp: DateTime<Utc>) -> bool {
        if !self.kill_switch.active {
            return false;
        }
        self.kill_switch = KillSwitch::default();
        self.updated_at = timestamp;
        true
    }

    /// Apply a partial limits update
    pub fn apply_update(&mut self, update: &RiskLimitsUpdate, timestamp: DateTime<Utc>) {
        if let Some(v) = update.max_orders_per_minute {
            self.limits.max_orders_per_minute = v;
        }
        if let Some(v) = update.max_daily_loss {
            self.limits.max_daily_loss = v;
        }
        if let Some(v) = update.max_position_size {
            self.limits.max_position_size = v;
        }
        if let Some(v) = update.max_total_exposure {
            self.limits.max_total_exposure = v;
        }
        self.updated_at = timestamp;
    }
}
