//! Risk Gate
//!
//! Two stages run before any order reaches execution:
//! - `can_trade`: kill switch and daily loss; a breach trips the kill switch
//! - `pre_trade_check`: position size, total exposure, order rate
//!
//! Rejections are values, never errors.

use chrono::{DateTime, NaiveTime, Utc};
use log::{debug, error, info, warn};
use meridian_core::{
    ExecutionMode, Order, OrderIntent, RiskConfig, RiskLimits, RiskLimitsUpdate, Side, Timestamp,
};
use meridian_ledger::Ledger;
use meridian_ports::{AuditCategory, AuditEntry, AuditSink, Clock};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::config_store::RiskConfigStore;
use crate::error::{Result, RiskError};
use crate::rate_limiter::{RateLimiter, SlidingWindowRateLimiter};

/// Outcome of a risk check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskDecision {
    Approved,
    Rejected { reason: String },
}

impl RiskDecision {
    pub fn rejected(reason: impl Into<String>) -> Self {
        RiskDecision::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, RiskDecision::Approved)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            RiskDecision::Approved => None,
            RiskDecision::Rejected { reason } => Some(reason),
        }
    }
}

/// Pre-trade risk gate shared by every broker of a process
#[derive(Clone)]
pub struct RiskGate {
    configs: RiskConfigStore,
    rate_limiter: Arc<dyn RateLimiter>,
    ledger: Ledger,
    clock: Arc<dyn Clock>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl RiskGate {
    pub fn new(
        defaults: RiskLimits,
        rate_limiter: Arc<dyn RateLimiter>,
        ledger: Ledger,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            configs: RiskConfigStore::new(defaults),
            rate_limiter,
            ledger,
            clock,
            audit: None,
        }
    }

    /// Gate with default limits and an in-process sliding window limiter
    pub fn with_defaults(ledger: Ledger, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            RiskLimits::default(),
            Arc::new(SlidingWindowRateLimiter::new()),
            ledger,
            clock,
        )
    }

    /// Record kill switch transitions to an audit trail
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn rate_limiter(&self) -> &Arc<dyn RateLimiter> {
        &self.rate_limiter
    }

    // ------------------------------------------------------------------
    // Stage 1: global gate
    // ------------------------------------------------------------------

    /// Whether `user_id` may place orders in `mode` right now
    ///
    /// Shadow is exempt. Otherwise fails closed on an active kill switch;
    /// a daily loss beyond the limit activates the kill switch first.
    pub fn can_trade(&self, user_id: &str, mode: ExecutionMode) -> RiskDecision {
        if mode.is_kill_switch_exempt() {
            return RiskDecision::Approved;
        }

        let now = self.clock.now();
        let config = self.configs.get(user_id, now);
        if config.kill_switch.active {
            let reason = config
                .kill_switch
                .reason
                .unwrap_or_else(|| "no reason given".to_string());
            return RiskDecision::rejected(format!("Kill switch active: {}", reason));
        }

        let pnl = self.daily_pnl_at(user_id, mode, now);
        let max_loss = config.limits.max_daily_loss;
        if pnl < -max_loss {
            let reason = format!("Daily loss limit exceeded: {} (max {})", pnl, max_loss);
            self.trip_kill_switch(user_id, &reason, now);
            return RiskDecision::rejected(reason);
        }

        RiskDecision::Approved
    }

    // ------------------------------------------------------------------
    // Stage 2: per-order checks
    // ------------------------------------------------------------------

    /// Check one intent valued at `reference_price`
    ///
    /// Position size applies to every order, exposure to BUY orders only.
    /// The rate limit applies to every order and is consumed only when all
    /// other checks pass.
    pub fn pre_trade_check(
        &self,
        user_id: &str,
        mode: ExecutionMode,
        intent: &OrderIntent,
        reference_price: Decimal,
    ) -> RiskDecision {
        let now = self.clock.now();
        let limits = self.configs.get(user_id, now).limits;

        let order_value = intent.size * reference_price;
        if order_value > limits.max_position_size {
            warn!(
                "[RISK] {} {} order value {} exceeds max position size {}",
                user_id, mode, order_value, limits.max_position_size
            );
            return RiskDecision::rejected(format!(
                "Position size {} exceeds limit {}",
                order_value, limits.max_position_size
            ));
        }

        if intent.side == Side::Buy {
            let exposure = self.ledger.open_exposure(user_id, mode);
            if exposure + order_value > limits.max_total_exposure {
                warn!(
                    "[RISK] {} {} exposure {} + {} exceeds max {}",
                    user_id, mode, exposure, order_value, limits.max_total_exposure
                );
                return RiskDecision::rejected(format!(
                    "Total exposure {} would exceed limit {}",
                    exposure + order_value,
                    limits.max_total_exposure
                ));
            }
        }

        let rate = self
            .rate_limiter
            .try_acquire(user_id, mode, limits.max_orders_per_minute, now);
        if !rate.allowed {
            warn!(
                "[RISK] {} {} rate limited: {}/{} in window",
                user_id, mode, rate.current, rate.limit
            );
            return RiskDecision::rejected(format!(
                "Rate limit: {} orders in last minute (max {})",
                rate.current, rate.limit
            ));
        }

        debug!(
            "[RISK] Approved {} {} {} x {} ({}/{} in window)",
            user_id, intent.side, intent.size, reference_price, rate.current, rate.limit
        );
        RiskDecision::Approved
    }

    // ------------------------------------------------------------------
    // Kill switch and limits
    // ------------------------------------------------------------------

    /// Manually activate the kill switch; false if already active
    pub fn activate_kill_switch(&self, user_id: &str, reason: &str) -> bool {
        self.trip_kill_switch(user_id, reason, self.clock.now())
    }

    /// Manually clear the kill switch; false if it was not active
    pub fn deactivate_kill_switch(&self, user_id: &str) -> bool {
        let now = self.clock.now();
        let cleared = self
            .configs
            .update(user_id, now, |c| c.deactivate_kill_switch(now));
        if cleared {
            info!("[RISK] Kill switch deactivated for {}", user_id);
            self.audit(AuditEntry::new(
                user_id,
                "KILL_SWITCH_DEACTIVATED",
                AuditCategory::Risk,
                json!({}),
                now,
            ));
        }
        cleared
    }

    pub fn risk_config(&self, user_id: &str) -> RiskConfig {
        self.configs.get(user_id, self.clock.now())
    }

    /// Apply a partial limits update atomically
    pub fn update_risk_config(
        &self,
        user_id: &str,
        update: &RiskLimitsUpdate,
    ) -> Result<RiskConfig> {
        validate_update(update)?;
        let now = self.clock.now();
        let config = self.configs.update(user_id, now, |c| {
            c.apply_update(update, now);
            c.clone()
        });
        info!("[RISK] Limits updated for {}: {:?}", user_id, config.limits);
        Ok(config)
    }

    /// Today's (UTC) cash PnL: SELL proceeds net of fees minus BUY costs
    /// including fees
    pub fn daily_pnl(&self, user_id: &str, mode: ExecutionMode) -> Decimal {
        self.daily_pnl_at(user_id, mode, self.clock.now())
    }

    fn daily_pnl_at(&self, user_id: &str, mode: ExecutionMode, now: Timestamp) -> Decimal {
        let day_start = start_of_day(now);
        self.ledger
            .filled_orders(user_id, mode)
            .iter()
            .filter(|o| o.filled_at.is_some_and(|t| t >= day_start && t <= now))
            .map(Order::cash_flow)
            .sum()
    }

    fn trip_kill_switch(&self, user_id: &str, reason: &str, now: Timestamp) -> bool {
        let activated = self
            .configs
            .update(user_id, now, |c| c.activate_kill_switch(reason, now));
        if activated {
            error!("[RISK] Kill switch activated for {}: {}", user_id, reason);
            self.audit(AuditEntry::new(
                user_id,
                "KILL_SWITCH_ACTIVATED",
                AuditCategory::Risk,
                json!({ "reason": reason }),
                now,
            ));
        }
        activated
    }

    fn audit(&self, entry: AuditEntry) {
        if let Some(sink) = &self.audit
            && let Err(e) = sink.record(entry)
        {
            warn!("[RISK] Audit write failed: {}", e);
        }
    }
}

fn start_of_day(now: Timestamp) -> Timestamp {
    DateTime::<Utc>::from_naive_utc_and_offset(now.date_naive().and_time(NaiveTime::MIN), Utc)
}

fn validate_update(update: &RiskLimitsUpdate) -> Result<()> {
    if update.max_orders_per_minute == Some(0) {
        return Err(RiskError::InvalidLimit {
            field: "max_orders_per_minute",
            value: Decimal::ZERO,
        });
    }
    let decimals = [
        ("max_daily_loss", update.max_daily_loss),
        ("max_position_size", update.max_position_size),
        ("max_total_exposure", update.max_total_exposure),
    ];
    for (field, value) in decimals {
        if let Some(value) = value
            && value <= Decimal::ZERO
        {
            return Err(RiskError::InvalidLimit { field, value });
        }
    }
    Ok(())
}
