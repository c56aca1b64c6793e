//! Live broker
//!
//! Fills are authoritative from the venue. Every submission is two-phase:
//!
//! ```text
//! record PENDING ──► gateway.submit ──┬─ Accepted ─► confirm (+ fill) ─► Success
//!                                     ├─ Rejected / Err ─► FAILED ────► Failure
//!                                     ├─ fill not applicable ─► FAILED ► Failure
//!                                     └─ timeout ─► stays PENDING ────► Failure
//! ```
//!
//! A timed-out order is left PENDING for an external reconciliation pass.

use async_trait::async_trait;
use log::{error, info, warn};
use meridian_core::{
    Balance, ExecutionMode, Fill, Liquidity, MarketState, Order, OrderId, OrderIntent,
    OrderStatus, Position,
};
use meridian_execution::ExecutionSimulator;
use meridian_ledger::{InitialState, PositionFilter};
use meridian_ports::{AuditCategory, GatewayError, GatewayFill, GatewayOrder, OrderGateway, SubmitOutcome};
use meridian_risk_manager::RiskDecision;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::broker::Broker;
use crate::context::{BrokerContext, actions};
use crate::error::{BrokerError, Result};
use crate::result::{CancelAllResult, CancelFailure, CancelResult, OrderResult};

pub struct LiveBroker {
    user_id: String,
    ctx: BrokerContext,
    gateway: Arc<dyn OrderGateway>,
    timeout: Duration,
    /// Cash basis when the venue reports no collateral balance
    initial_balance: Decimal,
}

/// The venue's own words for a failure
fn gateway_message(e: &GatewayError) -> String {
    match e {
        GatewayError::Submission(msg)
        | GatewayError::Cancellation(msg)
        | GatewayError::Connection(msg) => msg.clone(),
        GatewayError::Timeout(_) => e.to_string(),
    }
}

impl LiveBroker {
    pub fn new(
        user_id: impl Into<String>,
        ctx: BrokerContext,
        gateway: Arc<dyn OrderGateway>,
        timeout: Duration,
        initial_balance: Decimal,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            ctx,
            gateway,
            timeout,
            initial_balance,
        }
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    fn reject(&self, intent: &OrderIntent, reason: String) -> OrderResult {
        warn!("[LIVE] Order rejected for {}: {}", self.user_id, reason);
        self.ctx.audit(
            &self.user_id,
            actions::ORDER_REJECTED,
            AuditCategory::Risk,
            json!({
                "mode": ExecutionMode::Live,
                "token_id": intent.token_id,
                "side": intent.side,
                "size": intent.size,
                "reason": reason,
            }),
        );
        OrderResult::rejected(reason)
    }

    /// Second phase failed: the order is marked FAILED with the venue message
    fn fail(&self, order: &Order, message: String) -> Result<OrderResult> {
        error!("[LIVE] Order {} failed: {}", order.id, message);
        let failed = self.ctx.ledger.mark_failed(order.id, &message)?;
        self.ctx.audit(
            &self.user_id,
            actions::ORDER_FAILED,
            AuditCategory::Trading,
            json!({ "order_id": order.id, "error": message }),
        );
        Ok(OrderResult::failed("Order failed", message, failed))
    }

    fn venue_fill(&self, reported: &GatewayFill, submitted_price: Decimal) -> Fill {
        let liquidity = reported.liquidity.unwrap_or(Liquidity::Taker);
        let fees = reported.fees.unwrap_or_else(|| {
            self.ctx
                .simulator
                .fees()
                .calculate_fee(reported.size, reported.price, liquidity)
        });
        Fill {
            size: reported.size,
            price: reported.price,
            fees,
            slippage: (reported.price - submitted_price).abs(),
            liquidity,
        }
    }

    fn confirm(
        &self,
        pending: &Order,
        external_id: String,
        status: OrderStatus,
        fill: Option<GatewayFill>,
        submitted_price: Decimal,
    ) -> Result<Order> {
        // Fill statuses are reached by applying the fill, not by decree
        let acknowledged = match status {
            OrderStatus::Pending | OrderStatus::PartiallyFilled | OrderStatus::Filled => {
                OrderStatus::Open
            }
            other => other,
        };
        let mut order = self
            .ctx
            .ledger
            .confirm_order(pending.id, Some(external_id), acknowledged)?;

        let reported = match fill {
            Some(fill) => Some(fill),
            None if status == OrderStatus::Filled => Some(GatewayFill {
                size: pending.size,
                price: submitted_price,
                fees: None,
                liquidity: None,
            }),
            None => None,
        };
        if let Some(reported) = reported
            && order.is_open()
        {
            let fill = self.venue_fill(&reported, submitted_price);
            order = self.ctx.ledger.apply_fill(order.id, &fill)?.order;
        }
        Ok(order)
    }

    /// Order scoped to this account
    fn own_order(&self, order_id: OrderId) -> Result<Order> {
        let order = self.ctx.ledger.get_order(order_id)?;
        if order.user_id != self.user_id || order.mode != ExecutionMode::Live {
            return Err(BrokerError::NotFound(format!("Order {}", order_id)));
        }
        Ok(order)
    }
}

#[async_trait]
impl Broker for LiveBroker {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Live
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderResult> {
        intent.validate()?;
        self.ctx
            .ensure_sellable(&self.user_id, ExecutionMode::Live, intent)?;

        if let RiskDecision::Rejected { reason } = self.can_trade() {
            return Ok(self.reject(intent, reason));
        }

        let price = match intent.price {
            Some(price) => price,
            None => {
                let resolved = self.ctx.quote(&intent.token_id).await;
                ExecutionSimulator::base_price(intent.side, &resolved.quote)
            }
        };
        if let RiskDecision::Rejected { reason } =
            self.ctx
                .risk
                .pre_trade_check(&self.user_id, ExecutionMode::Live, intent, price)
        {
            return Ok(self.reject(intent, reason));
        }

        // Phase one: the intent is on record before the venue sees it
        let pending = self.ctx.ledger.record_order(
            &self.user_id,
            intent,
            ExecutionMode::Live,
            InitialState::Pending,
        )?;
        let submission = GatewayOrder {
            token_id: intent.token_id.clone(),
            side: intent.side,
            order_type: intent.order_type,
            size: intent.size,
            price,
        };

        let outcome = match tokio::time::timeout(self.timeout, self.gateway.submit(&submission)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let timeout = GatewayError::Timeout(self.timeout_ms());
                warn!(
                    "[LIVE] Order {} timed out after {}ms, left PENDING",
                    pending.id,
                    self.timeout_ms()
                );
                self.ctx.audit(
                    &self.user_id,
                    actions::ORDER_TIMEOUT,
                    AuditCategory::Trading,
                    json!({ "order_id": pending.id, "timeout_ms": self.timeout_ms() }),
                );
                return Ok(OrderResult::failed("Order timed out", timeout.to_string(), pending));
            }
        };

        // Phase two
        match outcome {
            Ok(SubmitOutcome::Accepted {
                external_id,
                status,
                fill,
            }) => {
                let order = match self.confirm(&pending, external_id, status, fill, price) {
                    Ok(order) => order,
                    Err(e) => {
                        // The venue holds the order; keep its id on the FAILED record
                        return self.fail(&pending, format!("Venue fill not recorded: {}", e));
                    }
                };
                info!(
                    "[LIVE] Order {} accepted as {} ({})",
                    order.id,
                    order.external_id.as_deref().unwrap_or("-"),
                    order.status
                );
                self.ctx.audit(
                    &self.user_id,
                    actions::ORDER_PLACED,
                    AuditCategory::Trading,
                    json!({
                        "order_id": order.id,
                        "mode": ExecutionMode::Live,
                        "external_id": order.external_id,
                        "token_id": order.token_id,
                        "side": order.side,
                        "size": order.size,
                        "price": price,
                        "status": order.status,
                    }),
                );
                Ok(OrderResult::success(order, "Order submitted"))
            }
            Ok(SubmitOutcome::Rejected { message }) => self.fail(&pending, message),
            Err(e) => self.fail(&pending, gateway_message(&e)),
        }
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<CancelResult> {
        let order = self.own_order(order_id)?;
        if !order.status.is_cancellable() {
            return Err(BrokerError::InvalidState(format!(
                "Cannot cancel order {} in status {}",
                order.id, order.status
            )));
        }
        let external_id = order
            .external_id
            .as_deref()
            .ok_or_else(|| BrokerError::NotFound("No external order ID".to_string()))?;

        match tokio::time::timeout(self.timeout, self.gateway.cancel(external_id)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let message = gateway_message(&e);
                warn!("[LIVE] Cancel of {} refused: {}", order.id, message);
                return Ok(CancelResult::NotCancelled { reason: message });
            }
            Err(_) => {
                let message = GatewayError::Timeout(self.timeout_ms()).to_string();
                warn!("[LIVE] Cancel of {} timed out", order.id);
                return Ok(CancelResult::NotCancelled { reason: message });
            }
        }

        let cancelled = self
            .ctx
            .ledger
            .cancel_order(&self.user_id, ExecutionMode::Live, order_id)?;
        info!("[LIVE] Order {} cancelled at venue", cancelled.id);
        self.ctx.audit(
            &self.user_id,
            actions::ORDER_CANCELLED,
            AuditCategory::Trading,
            json!({
                "order_id": cancelled.id,
                "mode": ExecutionMode::Live,
                "external_id": cancelled.external_id,
            }),
        );
        Ok(CancelResult::Cancelled(cancelled))
    }

    async fn cancel_all_orders(&self) -> Result<CancelAllResult> {
        let open: Vec<Order> = self
            .ctx
            .ledger
            .list_open_orders(&self.user_id, ExecutionMode::Live)
            .into_iter()
            .filter(|o| o.status.is_cancellable())
            .collect();

        let venue = match tokio::time::timeout(self.timeout, self.gateway.cancel_all()).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.timeout_ms())),
        };
        if let Err(e) = venue {
            let reason = gateway_message(&e);
            error!("[LIVE] Cancel all failed for {}: {}", self.user_id, reason);
            return Ok(CancelAllResult {
                cancelled: Vec::new(),
                failed: open
                    .iter()
                    .map(|o| CancelFailure {
                        order_id: o.id,
                        reason: reason.clone(),
                    })
                    .collect(),
            });
        }

        let mut result = CancelAllResult::default();
        for order in open {
            match self
                .ctx
                .ledger
                .cancel_order(&self.user_id, ExecutionMode::Live, order.id)
            {
                Ok(cancelled) => result.cancelled.push(cancelled),
                Err(e) => result.failed.push(CancelFailure {
                    order_id: order.id,
                    reason: e.to_string(),
                }),
            }
        }
        info!(
            "[LIVE] Cancel all for {}: {} cancelled, {} failed",
            self.user_id,
            result.cancelled.len(),
            result.failed.len()
        );
        self.ctx.audit(
            &self.user_id,
            actions::ORDER_CANCELLED,
            AuditCategory::Trading,
            json!({ "mode": ExecutionMode::Live, "cancelled": result.cancelled.len() }),
        );
        Ok(result)
    }

    async fn get_open_orders(&self) -> Result<Vec<Order>> {
        self.ctx
            .ledger
            .expire_orders(&self.user_id, ExecutionMode::Live, self.ctx.now());
        Ok(self
            .ctx
            .ledger
            .list_open_orders(&self.user_id, ExecutionMode::Live))
    }

    async fn get_positions(&self, filter: PositionFilter) -> Result<Vec<Position>> {
        Ok(self
            .ctx
            .positions_with_marks(&self.user_id, ExecutionMode::Live, filter)
            .await)
    }

    /// Venue collateral when reported, otherwise the ledger projection
    async fn get_balance(&self) -> Result<Balance> {
        let projected =
            self.ctx
                .ledger
                .compute_balance(&self.user_id, ExecutionMode::Live, self.initial_balance);

        match tokio::time::timeout(self.timeout, self.gateway.collateral_balance()).await {
            Ok(Ok(Some(collateral))) => Ok(Balance::new(
                collateral,
                projected.in_orders,
                projected.in_positions,
            )),
            Ok(Ok(None)) => Ok(projected),
            Ok(Err(e)) => {
                warn!("[LIVE] Collateral balance unavailable: {}", e);
                Ok(projected)
            }
            Err(_) => {
                warn!("[LIVE] Collateral balance timed out");
                Ok(projected)
            }
        }
    }

    async fn get_market_state(&self, market_id: &str, token_id: &str) -> Result<MarketState> {
        Ok(self.ctx.market_state(market_id, token_id).await)
    }

    fn can_trade(&self) -> RiskDecision {
        self.ctx.risk.can_trade(&self.user_id, ExecutionMode::Live)
    }
}
