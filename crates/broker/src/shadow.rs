//! Shadow broker
//!
//! Prices every order like the paper broker but never sends anything to
//! a venue. Orders are FILLED on placement; non-crossing limits fill at
//! their limit price as maker. Exempt from the kill switch.

use async_trait::async_trait;
use log::info;
use meridian_core::{
    Balance, ExecutionMode, Fill, Liquidity, MarketState, Order, OrderId, OrderIntent, Position,
};
use meridian_execution::{ExecutionSimulator, SimulatedExecution};
use meridian_ledger::{InitialState, PositionFilter};
use meridian_ports::AuditCategory;
use meridian_risk_manager::RiskDecision;
use rust_decimal::Decimal;
use serde_json::json;

use crate::broker::Broker;
use crate::context::{BrokerContext, actions};
use crate::error::Result;
use crate::result::{CancelAllResult, CancelResult, OrderResult, ShadowComparison};

pub struct ShadowBroker {
    user_id: String,
    ctx: BrokerContext,
    initial_balance: Decimal,
}

impl ShadowBroker {
    pub fn new(user_id: impl Into<String>, ctx: BrokerContext, initial_balance: Decimal) -> Self {
        Self {
            user_id: user_id.into(),
            ctx,
            initial_balance,
        }
    }

    /// Shadow PnL minus paper PnL over the same account
    pub fn compare_with_paper(&self) -> ShadowComparison {
        let total_pnl = |mode| -> Decimal {
            self.ctx
                .ledger
                .list_positions(&self.user_id, mode, PositionFilter::All)
                .iter()
                .map(Position::total_pnl)
                .sum()
        };
        let trades = |mode| self.ctx.ledger.filled_orders(&self.user_id, mode).len();

        let shadow_pnl = total_pnl(ExecutionMode::Shadow);
        let paper_pnl = total_pnl(ExecutionMode::Paper);
        ShadowComparison {
            shadow_pnl,
            paper_pnl,
            difference: shadow_pnl - paper_pnl,
            shadow_trades: trades(ExecutionMode::Shadow),
            paper_trades: trades(ExecutionMode::Paper),
        }
    }

    fn shadow_fill(&self, intent: &OrderIntent, execution: SimulatedExecution) -> Fill {
        match execution {
            SimulatedExecution::Filled(fill) => fill,
            SimulatedExecution::Resting => {
                let price = intent.price.unwrap_or_default();
                Fill {
                    size: intent.size,
                    price,
                    fees: self
                        .ctx
                        .simulator
                        .fees()
                        .calculate_fee(intent.size, price, Liquidity::Maker),
                    slippage: Decimal::ZERO,
                    liquidity: Liquidity::Maker,
                }
            }
        }
    }
}

#[async_trait]
impl Broker for ShadowBroker {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Shadow
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderResult> {
        intent.validate()?;
        self.ctx
            .ensure_sellable(&self.user_id, ExecutionMode::Shadow, intent)?;

        let resolved = self.ctx.quote(&intent.token_id).await;
        let reference = ExecutionSimulator::reference_price(intent, &resolved.quote);
        if let RiskDecision::Rejected { reason } =
            self.ctx
                .risk
                .pre_trade_check(&self.user_id, ExecutionMode::Shadow, intent, reference)
        {
            self.ctx.audit(
                &self.user_id,
                actions::ORDER_REJECTED,
                AuditCategory::Risk,
                json!({ "mode": ExecutionMode::Shadow, "token_id": intent.token_id, "reason": reason }),
            );
            return Ok(OrderResult::rejected(reason));
        }

        let execution = self.ctx.simulator.simulate(intent, &resolved.quote);
        let fill = self.shadow_fill(intent, execution);
        let order = self.ctx.ledger.record_order(
            &self.user_id,
            intent,
            ExecutionMode::Shadow,
            InitialState::Filled(fill),
        )?;

        info!(
            "[SHADOW] Order {} filled (not executed): {} {} @ {}",
            order.id,
            order.side,
            order.filled_size,
            order.filled_price.unwrap_or_default()
        );
        self.ctx.audit(
            &self.user_id,
            actions::SHADOW_ORDER,
            AuditCategory::Trading,
            json!({
                "order_id": order.id,
                "executed": false,
                "token_id": order.token_id,
                "side": order.side,
                "size": order.size,
                "filled_price": order.filled_price,
                "fees": order.fees,
                "fallback_quote": resolved.is_fallback,
            }),
        );
        Ok(OrderResult::success(order, "Shadow order filled"))
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<CancelResult> {
        info!("[SHADOW] Cancel requested for {} (nothing is ever resting)", order_id);
        self.ctx.audit(
            &self.user_id,
            actions::SHADOW_CANCEL,
            AuditCategory::Trading,
            json!({ "order_id": order_id, "executed": false }),
        );
        Ok(CancelResult::NotCancelled {
            reason: "Shadow orders are filled on placement".to_string(),
        })
    }

    async fn cancel_all_orders(&self) -> Result<CancelAllResult> {
        info!("[SHADOW] Cancel all requested for {}", self.user_id);
        self.ctx.audit(
            &self.user_id,
            actions::SHADOW_CANCEL,
            AuditCategory::Trading,
            json!({ "all": true, "executed": false }),
        );
        Ok(CancelAllResult::default())
    }

    async fn get_open_orders(&self) -> Result<Vec<Order>> {
        Ok(self
            .ctx
            .ledger
            .list_open_orders(&self.user_id, ExecutionMode::Shadow))
    }

    async fn get_positions(&self, filter: PositionFilter) -> Result<Vec<Position>> {
        Ok(self
            .ctx
            .positions_with_marks(&self.user_id, ExecutionMode::Shadow, filter)
            .await)
    }

    async fn get_balance(&self) -> Result<Balance> {
        Ok(self
            .ctx
            .ledger
            .compute_balance(&self.user_id, ExecutionMode::Shadow, self.initial_balance))
    }

    async fn get_market_state(&self, market_id: &str, token_id: &str) -> Result<MarketState> {
        Ok(self.ctx.market_state(market_id, token_id).await)
    }

    fn can_trade(&self) -> RiskDecision {
        self.ctx.risk.can_trade(&self.user_id, ExecutionMode::Shadow)
    }
}
