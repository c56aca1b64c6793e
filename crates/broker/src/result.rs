//! Typed outcomes of broker operations

use meridian_core::{Order, OrderId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of `place_order`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderResult {
    Success {
        order: Order,
        message: String,
    },
    Failure {
        /// Human-readable reason: the risk rejection, or "Order failed"
        reason: String,
        /// Upstream message, verbatim
        error: Option<String>,
        /// The ledger record, when one was created
        order: Option<Order>,
    },
}

impl OrderResult {
    pub fn success(order: Order, message: impl Into<String>) -> Self {
        OrderResult::Success {
            order,
            message: message.into(),
        }
    }

    /// Business rejection before anything reached the ledger
    pub fn rejected(reason: impl Into<String>) -> Self {
        OrderResult::Failure {
            reason: reason.into(),
            error: None,
            order: None,
        }
    }

    pub fn failed(reason: impl Into<String>, error: impl Into<String>, order: Order) -> Self {
        OrderResult::Failure {
            reason: reason.into(),
            error: Some(error.into()),
            order: Some(order),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OrderResult::Success { .. })
    }

    pub fn order(&self) -> Option<&Order> {
        match self {
            OrderResult::Success { order, .. } => Some(order),
            OrderResult::Failure { order, .. } => order.as_ref(),
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            OrderResult::Success { .. } => None,
            OrderResult::Failure { reason, .. } => Some(reason),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            OrderResult::Success { .. } => None,
            OrderResult::Failure { error, .. } => error.as_deref(),
        }
    }
}

/// Outcome of `cancel_order`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelResult {
    Cancelled(Order),
    NotCancelled { reason: String },
}

impl CancelResult {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CancelResult::Cancelled(_))
    }
}

/// One order `cancel_all_orders` could not cancel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelFailure {
    pub order_id: OrderId,
    pub reason: String,
}

/// Outcome of `cancel_all_orders`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CancelAllResult {
    pub cancelled: Vec<Order>,
    pub failed: Vec<CancelFailure>,
}

/// Shadow versus paper PnL on the same market data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowComparison {
    /// Realized plus unrealized PnL over shadow positions
    pub shadow_pnl: Decimal,
    pub paper_pnl: Decimal,
    /// shadow_pnl - paper_pnl
    pub difference: Decimal,
    pub shadow_trades: usize,
    pub paper_trades: usize,
}
