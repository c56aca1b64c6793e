use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ExecutionMode, OrderStatus, OrderType, Side};
use crate::error::ValidationError;
use crate::values::{MarketId, TokenId, UserId};

/// Unique identifier for an order
pub type OrderId = Uuid;

/// What the caller wants to trade, before any lifecycle state exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub market_id: MarketId,
    pub token_id: TokenId,
    pub side: Side,
    pub order_type: OrderType,
    pub size: Decimal,
    /// Required for LIMIT, GTC and GTD orders
    pub price: Option<Decimal>,
    /// Required for GTD orders
    pub expires_at: Option<DateTime<Utc>>,
}

impl OrderIntent {
    /// Market order for `size` tokens
    pub fn market(
        market_id: impl Into<MarketId>,
        token_id: impl Into<TokenId>,
        side: Side,
        size: Decimal,
    ) -> Self {
        Self {
            market_id: market_id.into(),
            token_id: token_id.into(),
            side,
            order_type: OrderType::Market,
            size,
            price: None,
            expires_at: None,
        }
    }

    /// Limit order for `size` tokens at `price`
    pub fn limit(
        market_id: impl Into<MarketId>,
        token_id: impl Into<TokenId>,
        side: Side,
        size: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            market_id: market_id.into(),
            token_id: token_id.into(),
            side,
            order_type: OrderType::Limit,
            size,
            price: Some(price),
            expires_at: None,
        }
    }

    /// Override the order type, keeping everything else
    pub fn with_type(mut self, order_type: OrderType) -> Self {
        self.order_type = order_type;
        self
    }

    /// Attach an expiry (GTD)
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Check the intent is well-formed
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.market_id.is_empty() {
            return Err(ValidationError::MissingField("market id"));
        }
        if self.token_id.is_empty() {
            return Err(ValidationError::MissingField("token id"));
        }
        if self.size <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveSize(self.size));
        }
        match self.price {
            Some(price) if price <= Decimal::ZERO || price > Decimal::ONE => {
                return Err(ValidationError::PriceOutOfRange(price));
            }
            None if self.order_type.requires_price() => {
                return Err(ValidationError::MissingPrice(self.order_type.to_string()));
            }
            _ => {}
        }
        if self.order_type == OrderType::Gtd && self.expires_at.is_none() {
            return Err(ValidationError::MissingExpiry);
        }
        Ok(())
    }
}

/// Full order record: the immutable intent plus its mutable lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub market_id: MarketId,
    pub token_id: TokenId,
    pub side: Side,
    pub order_type: OrderType,
    /// Requested size
    pub size: Decimal,
    /// Requested price (limit price for limit-type orders)
    pub price: Option<Decimal>,
    pub mode: ExecutionMode,
    pub status: OrderStatus,
    /// Cumulative filled size, never above `size`
    pub filled_size: Decimal,
    /// Size-weighted average fill price
    pub filled_price: Option<Decimal>,
    /// Cumulative fees, never negative
    pub fees: Decimal,
    /// Cumulative slippage per unit, size-weighted
    pub slippage: Decimal,
    /// Venue order id (live orders only)
    pub external_id: Option<String>,
    /// Why the order failed
    pub error_message: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub filled_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Create a new order record from an intent
    pub fn from_intent(
        user_id: impl Into<UserId>,
        intent: &OrderIntent,
        mode: ExecutionMode,
        status: OrderStatus,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            market_id: intent.market_id.clone(),
            token_id: intent.token_id.clone(),
            side: intent.side,
            order_type: intent.order_type,
            size: intent.size,
            price: intent.price,
            mode,
            status,
            filled_size: Decimal::ZERO,
            filled_price: None,
            fees: Decimal::ZERO,
            slippage: Decimal::ZERO,
            external_id: None,
            error_message: None,
            expires_at: intent.expires_at,
            created_at: timestamp,
            updated_at: timestamp,
            filled_at: None,
            cancelled_at: None,
        }
    }

    /// Returns remaining size to be filled
    pub fn remaining_size(&self) -> Decimal {
        self.size - self.filled_size
    }

    /// Returns true if the order is completely filled
    pub fn is_filled(&self) -> bool {
        self.filled_size >= self.size
    }

    /// Still working (pending, resting or partially filled)
    pub fn is_open(&self) -> bool {
        self.status.is_active()
    }

    /// Filled notional at the average fill price
    pub fn filled_value(&self) -> Decimal {
        self.filled_price
            .map(|price| self.filled_size * price)
            .unwrap_or(Decimal::ZERO)
    }

    /// Cash impact of the fills so far: negative for buys, positive for sells
    pub fn cash_flow(&self) -> Decimal {
        match self.side {
            Side::Buy => -(self.filled_value() + self.fees),
            Side::Sell => self.filled_value() - self.fees,
        }
    }

    /// Whether a GTD order has passed its expiry
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.order_type == OrderType::Gtd && self.expires_at.is_some_and(|at| now >= at)
    }
}
