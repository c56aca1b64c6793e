//! Broker trait
//!
//! One capability set, three variants. The variants differ in where a
//! fill comes from and what a cancel does:
//!
//! | Variant | Fill source              | Cancel               |
//! |---------|--------------------------|----------------------|
//! | Paper   | Execution simulator      | Ledger only          |
//! | Live    | Order gateway (venue)    | Gateway, then ledger |
//! | Shadow  | Simulator, always FILLED | No-op, audit only    |

use async_trait::async_trait;
use meridian_core::{Balance, ExecutionMode, MarketState, Order, OrderId, OrderIntent, Position};
use meridian_ledger::PositionFilter;
use meridian_risk_manager::RiskDecision;

use crate::error::Result;
use crate::result::{CancelAllResult, CancelResult, OrderResult};

/// Trading account of one user in one execution mode
///
/// `place_order` and `cancel_order` report business outcomes (risk
/// rejection, venue refusal) in their result values; `Err` is reserved
/// for malformed input and systemic faults.
#[async_trait]
pub trait Broker: Send + Sync {
    fn mode(&self) -> ExecutionMode;

    fn user_id(&self) -> &str;

    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderResult>;

    async fn cancel_order(&self, order_id: OrderId) -> Result<CancelResult>;

    async fn cancel_all_orders(&self) -> Result<CancelAllResult>;

    /// Pending, open and partially filled orders (expired GTD orders are
    /// swept first)
    async fn get_open_orders(&self) -> Result<Vec<Order>>;

    /// Positions with marks refreshed from the market data source
    async fn get_positions(&self, filter: PositionFilter) -> Result<Vec<Position>>;

    async fn get_balance(&self) -> Result<Balance>;

    async fn get_market_state(&self, market_id: &str, token_id: &str) -> Result<MarketState>;

    /// Global risk gate for this account
    fn can_trade(&self) -> RiskDecision;
}
