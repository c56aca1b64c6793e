//! Collaborators shared by every broker variant

use log::{debug, warn};
use meridian_core::{
    ExecutionMode, MarketState, OrderIntent, Position, RiskLimits, Side, Timestamp,
};
use meridian_execution::{ExecutionConfig, ExecutionSimulator, ResolvedQuote};
use meridian_ledger::{Ledger, PositionFilter};
use meridian_ports::{AuditCategory, AuditEntry, AuditSink, Clock, MarketDataSource};
use meridian_risk_manager::{RiskGate, SlidingWindowRateLimiter};
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::Result;

/// Audit action names
pub mod actions {
    pub const ORDER_PLACED: &str = "ORDER_PLACED";
    pub const ORDER_FILLED: &str = "ORDER_FILLED";
    pub const ORDER_REJECTED: &str = "ORDER_REJECTED";
    pub const ORDER_FAILED: &str = "ORDER_FAILED";
    pub const ORDER_TIMEOUT: &str = "ORDER_TIMEOUT";
    pub const ORDER_CANCELLED: &str = "ORDER_CANCELLED";
    pub const SHADOW_ORDER: &str = "SHADOW_ORDER";
    pub const SHADOW_CANCEL: &str = "SHADOW_CANCEL";
}

/// Ledger, risk gate, simulator and ports, cheaply cloneable
#[derive(Clone)]
pub struct BrokerContext {
    pub ledger: Ledger,
    pub risk: RiskGate,
    pub simulator: ExecutionSimulator,
    pub market_data: Arc<dyn MarketDataSource>,
    pub audit: Arc<dyn AuditSink>,
    pub clock: Arc<dyn Clock>,
}

impl BrokerContext {
    /// Wire a fresh ledger, risk gate and simulator around the given ports
    pub fn new(
        execution: &ExecutionConfig,
        risk_defaults: RiskLimits,
        market_data: Arc<dyn MarketDataSource>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ledger = Ledger::new(Arc::clone(&clock));
        let risk = RiskGate::new(
            risk_defaults,
            Arc::new(SlidingWindowRateLimiter::new()),
            ledger.clone(),
            Arc::clone(&clock),
        )
        .with_audit(Arc::clone(&audit));

        Self {
            ledger,
            risk,
            simulator: ExecutionSimulator::new(execution),
            market_data,
            audit,
            clock,
        }
    }

    /// Quote for `token_id`, falling back to the configured quote on failure
    pub async fn quote(&self, token_id: &str) -> ResolvedQuote {
        let result = self.market_data.get_quote(token_id).await;
        self.simulator.resolve_quote(token_id, result)
    }

    pub async fn market_state(&self, market_id: &str, token_id: &str) -> MarketState {
        let resolved = self.quote(token_id).await;
        MarketState::from_quote(market_id, token_id, &resolved.quote, resolved.is_fallback)
    }

    /// A SELL must be covered by the open position in `mode`
    ///
    /// Runs before any risk check so an uncovered SELL neither reaches the
    /// venue nor uses a rate-limit slot.
    pub fn ensure_sellable(&self, user_id: &str, mode: ExecutionMode, intent: &OrderIntent) -> Result<()> {
        if intent.side == Side::Sell {
            self.ledger.check_sell(user_id, mode, intent)?;
        }
        Ok(())
    }

    /// Re-mark open positions at the midpoint, then list
    ///
    /// Fallback quotes never overwrite a mark.
    pub async fn positions_with_marks(
        &self,
        user_id: &str,
        mode: ExecutionMode,
        filter: PositionFilter,
    ) -> Vec<Position> {
        let tokens: HashSet<String> = self
            .ledger
            .list_positions(user_id, mode, PositionFilter::Open)
            .into_iter()
            .map(|p| p.token_id)
            .collect();

        for token_id in tokens {
            let resolved = self.quote(&token_id).await;
            if resolved.is_fallback {
                debug!("[BROKER] Keeping previous mark for {}", token_id);
                continue;
            }
            self.ledger
                .update_mark_price(user_id, mode, &token_id, resolved.quote.midpoint);
        }

        self.ledger.list_positions(user_id, mode, filter)
    }

    /// Record an audit entry; failures are logged and dropped
    pub fn audit(
        &self,
        user_id: &str,
        action: &str,
        category: AuditCategory,
        details: serde_json::Value,
    ) {
        let entry = AuditEntry::new(user_id, action, category, details, self.clock.now());
        if let Err(e) = self.audit.record(entry) {
            warn!("[AUDIT] Failed to record {} for {}: {}", action, user_id, e);
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}
