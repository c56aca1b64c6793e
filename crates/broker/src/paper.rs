//! Paper broker
//!
//! Fills come from the execution simulator against live quotes; cash is
//! a virtual balance projected from the ledger.

use async_trait::async_trait;
use log::{info, warn};
use meridian_core::{
    Balance, ExecutionMode, MarketState, Order, OrderId, OrderIntent, Position,
};
use meridian_execution::{ExecutionSimulator, SimulatedExecution};
use meridian_ledger::{InitialState, PositionFilter};
use meridian_ports::AuditCategory;
use meridian_risk_manager::RiskDecision;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashMap;

use crate::broker::Broker;
use crate::context::{BrokerContext, actions};
use crate::error::Result;
use crate::result::{CancelAllResult, CancelFailure, CancelResult, OrderResult};

pub struct PaperBroker {
    user_id: String,
    ctx: BrokerContext,
    initial_balance: Decimal,
}

impl PaperBroker {
    pub fn new(user_id: impl Into<String>, ctx: BrokerContext, initial_balance: Decimal) -> Self {
        Self {
            user_id: user_id.into(),
            ctx,
            initial_balance,
        }
    }

    pub fn initial_balance(&self) -> Decimal {
        self.initial_balance
    }

    /// Fill resting limit orders whose price the market has crossed
    ///
    /// Executes at the limit price with the maker fee. Orders are only
    /// checked against live quotes, never the fallback.
    pub async fn process_resting_orders(&self) -> Result<Vec<Order>> {
        let mode = ExecutionMode::Paper;
        self.ctx.ledger.expire_orders(&self.user_id, mode, self.ctx.now());

        let mut quotes = HashMap::new();
        let mut filled = Vec::new();
        for order in self.ctx.ledger.list_open_orders(&self.user_id, mode) {
            if !quotes.contains_key(&order.token_id) {
                let resolved = self.ctx.quote(&order.token_id).await;
                quotes.insert(order.token_id.clone(), resolved);
            }
            let Some(resolved) = quotes.get(&order.token_id) else {
                continue;
            };
            if resolved.is_fallback {
                continue;
            }
            let Some(fill) = self.ctx.simulator.fill_resting(&order, &resolved.quote) else {
                continue;
            };

            match self.ctx.ledger.apply_fill(order.id, &fill) {
                Ok(outcome) => {
                    info!(
                        "[PAPER] Resting order {} filled: {} @ {}",
                        order.id, fill.size, fill.price
                    );
                    self.ctx.audit(
                        &self.user_id,
                        actions::ORDER_FILLED,
                        AuditCategory::Trading,
                        json!({
                            "order_id": order.id,
                            "size": fill.size,
                            "price": fill.price,
                            "fees": fill.fees,
                            "liquidity": fill.liquidity,
                        }),
                    );
                    filled.push(outcome.order);
                }
                Err(e) => warn!("[PAPER] Could not fill resting order {}: {}", order.id, e),
            }
        }
        Ok(filled)
    }

    fn reject(&self, intent: &OrderIntent, reason: String) -> OrderResult {
        warn!("[PAPER] Order rejected for {}: {}", self.user_id, reason);
        self.ctx.audit(
            &self.user_id,
            actions::ORDER_REJECTED,
            AuditCategory::Risk,
            json!({
                "mode": ExecutionMode::Paper,
                "token_id": intent.token_id,
                "side": intent.side,
                "size": intent.size,
                "reason": reason,
            }),
        );
        OrderResult::rejected(reason)
    }
}

#[async_trait]
impl Broker for PaperBroker {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Paper
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderResult> {
        intent.validate()?;
        self.ctx
            .ensure_sellable(&self.user_id, ExecutionMode::Paper, intent)?;

        if let RiskDecision::Rejected { reason } = self.can_trade() {
            return Ok(self.reject(intent, reason));
        }

        let resolved = self.ctx.quote(&intent.token_id).await;
        let reference = ExecutionSimulator::reference_price(intent, &resolved.quote);
        if let RiskDecision::Rejected { reason } =
            self.ctx
                .risk
                .pre_trade_check(&self.user_id, ExecutionMode::Paper, intent, reference)
        {
            return Ok(self.reject(intent, reason));
        }

        let (order, message) = match self.ctx.simulator.simulate(intent, &resolved.quote) {
            SimulatedExecution::Filled(fill) => {
                let order = self.ctx.ledger.record_order(
                    &self.user_id,
                    intent,
                    ExecutionMode::Paper,
                    InitialState::Filled(fill),
                )?;
                info!(
                    "[PAPER] Order {} filled: {} {} @ {} (fees {})",
                    order.id,
                    order.side,
                    order.filled_size,
                    order.filled_price.unwrap_or_default(),
                    order.fees
                );
                (order, "Order filled")
            }
            SimulatedExecution::Resting => {
                let order = self.ctx.ledger.record_order(
                    &self.user_id,
                    intent,
                    ExecutionMode::Paper,
                    InitialState::Open,
                )?;
                info!(
                    "[PAPER] Order {} resting: {} {} @ {}",
                    order.id,
                    order.side,
                    order.size,
                    order.price.unwrap_or_default()
                );
                (order, "Order placed")
            }
        };

        self.ctx.audit(
            &self.user_id,
            actions::ORDER_PLACED,
            AuditCategory::Trading,
            json!({
                "order_id": order.id,
                "mode": ExecutionMode::Paper,
                "token_id": order.token_id,
                "side": order.side,
                "order_type": order.order_type,
                "size": order.size,
                "status": order.status,
                "filled_price": order.filled_price,
                "fees": order.fees,
                "fallback_quote": resolved.is_fallback,
            }),
        );
        Ok(OrderResult::success(order, message))
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<CancelResult> {
        let order = self
            .ctx
            .ledger
            .cancel_order(&self.user_id, ExecutionMode::Paper, order_id)?;
        self.ctx.audit(
            &self.user_id,
            actions::ORDER_CANCELLED,
            AuditCategory::Trading,
            json!({ "order_id": order.id, "mode": ExecutionMode::Paper }),
        );
        Ok(CancelResult::Cancelled(order))
    }

    async fn cancel_all_orders(&self) -> Result<CancelAllResult> {
        let mut result = CancelAllResult::default();
        for order in self.ctx.ledger.list_open_orders(&self.user_id, ExecutionMode::Paper) {
            match self.cancel_order(order.id).await {
                Ok(CancelResult::Cancelled(order)) => result.cancelled.push(order),
                Ok(CancelResult::NotCancelled { reason }) => result.failed.push(CancelFailure {
                    order_id: order.id,
                    reason,
                }),
                Err(e) => result.failed.push(CancelFailure {
                    order_id: order.id,
                    reason: e.to_string(),
                }),
            }
        }
        info!(
            "[PAPER] Cancel all for {}: {} cancelled, {} failed",
            self.user_id,
            result.cancelled.len(),
            result.failed.len()
        );
        Ok(result)
    }

    async fn get_open_orders(&self) -> Result<Vec<Order>> {
        self.ctx
            .ledger
            .expire_orders(&self.user_id, ExecutionMode::Paper, self.ctx.now());
        Ok(self
            .ctx
            .ledger
            .list_open_orders(&self.user_id, ExecutionMode::Paper))
    }

    async fn get_positions(&self, filter: PositionFilter) -> Result<Vec<Position>> {
        Ok(self
            .ctx
            .positions_with_marks(&self.user_id, ExecutionMode::Paper, filter)
            .await)
    }

    async fn get_balance(&self) -> Result<Balance> {
        Ok(self
            .ctx
            .ledger
            .compute_balance(&self.user_id, ExecutionMode::Paper, self.initial_balance))
    }

    async fn get_market_state(&self, market_id: &str, token_id: &str) -> Result<MarketState> {
        Ok(self.ctx.market_state(market_id, token_id).await)
    }

    fn can_trade(&self) -> RiskDecision {
        self.ctx.risk.can_trade(&self.user_id, ExecutionMode::Paper)
    }
}
