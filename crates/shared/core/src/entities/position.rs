use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ExecutionMode;
use crate::values::{MarketId, TokenId, UserId};

/// Unique key of a position: one per (user, market, token, mode)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionKey {
    pub user_id: UserId,
    pub market_id: MarketId,
    pub token_id: TokenId,
    pub mode: ExecutionMode,
}

impl PositionKey {
    pub fn new(
        user_id: impl Into<UserId>,
        market_id: impl Into<MarketId>,
        token_id: impl Into<TokenId>,
        mode: ExecutionMode,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            market_id: market_id.into(),
            token_id: token_id.into(),
            mode,
        }
    }
}

/// Long exposure in one outcome token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Unique position identifier
    pub id: Uuid,

    pub user_id: UserId,
    pub market_id: MarketId,
    pub token_id: TokenId,
    pub mode: ExecutionMode,

    /// Current size (never negative)
    pub size: Decimal,

    /// Size-weighted average entry price
    pub avg_entry_price: Decimal,

    /// Latest mark price (for unrealized P&L)
    pub current_price: Option<Decimal>,

    /// Cumulative realized profit/loss
    pub realized_pnl: Decimal,

    /// When the position was opened
    pub opened_at: DateTime<Utc>,

    /// Set once size reaches zero
    pub closed_at: Option<DateTime<Utc>>,

    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl Position {
    /// Open a new position from a first buy fill
    pub fn open(key: &PositionKey, size: Decimal, price: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: key.user_id.clone(),
            market_id: key.market_id.clone(),
            token_id: key.token_id.clone(),
            mode: key.mode,
            size,
            avg_entry_price: price,
            current_price: None,
            realized_pnl: Decimal::ZERO,
            opened_at: timestamp,
            closed_at: None,
            updated_at: timestamp,
        }
    }

    pub fn key(&self) -> PositionKey {
        PositionKey::new(
            self.user_id.clone(),
            self.market_id.clone(),
            self.token_id.clone(),
            self.mode,
        )
    }

    /// Add to the position, re-deriving the average entry price
    pub fn increase(&mut self, size: Decimal, price: Decimal, timestamp: DateTime<Utc>) {
        let old_cost = self.size * self.avg_entry_price;
        let new_cost = size * price;
        let total_size = self.size + size;

        if total_size > Decimal::ZERO {
            self.avg_entry_price = (old_cost + new_cost) / total_size;
        }

        self.size = total_size;
        self.updated_at = timestamp;
    }

    /// Reduce the position, returning the P&L realized by this fill
    ///
    /// The average entry price is a cost-basis figure and is left untouched.
    pub fn decrease(&mut self, size: Decimal, price: Decimal, timestamp: DateTime<Utc>) -> Decimal {
        let pnl = (price - self.avg_entry_price) * size;
        self.realized_pnl += pnl;
        self.size -= size;

        if self.size <= Decimal::ZERO {
            self.size = Decimal::ZERO;
            self.closed_at = Some(timestamp);
        }

        self.updated_at = timestamp;
        pnl
    }

    /// Update the mark price
    pub fn update_mark_price(&mut self, price: Decimal, timestamp: DateTime<Utc>) {
        self.current_price = Some(price);
        self.updated_at = timestamp;
    }

    /// Mark price, falling back to the entry price when no mark is known
    pub fn mark_or_entry(&self) -> Decimal {
        self.current_price.unwrap_or(self.avg_entry_price)
    }

    /// Unrealized P&L at the current mark
    pub fn unrealized_pnl(&self) -> Decimal {
        if self.is_closed() {
            return Decimal::ZERO;
        }
        (self.mark_or_entry() - self.avg_entry_price) * self.size
    }

    /// Realized plus unrealized P&L
    pub fn total_pnl(&self) -> Decimal {
        self.realized_pnl + self.unrealized_pnl()
    }

    /// Mark-to-market value of the remaining size
    pub fn market_value(&self) -> Decimal {
        self.size * self.mark_or_entry()
    }

    /// Check if position is closed
    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }
}
