//! In-memory ledger
//!
//! Owns every Order and Position record. All mutations go through the
//! operations below, which enforce the lifecycle and accounting invariants.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{debug, info, warn};
use meridian_core::{
    Balance, ExecutionMode, Fill, Order, OrderId, OrderIntent, OrderStatus, Position,
    PositionKey, Side,
};
use meridian_ports::Clock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{LedgerError, Result};
use crate::locks::KeyedLocks;

/// State a new order is recorded in
#[derive(Debug, Clone, PartialEq)]
pub enum InitialState {
    /// Awaiting venue acknowledgement
    Pending,
    /// Resting without fills
    Open,
    /// Executed immediately with the given fill
    Filled(Fill),
}

/// Which positions a listing returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PositionFilter {
    /// Only positions with size > 0
    #[default]
    Open,
    /// Only closed positions
    Closed,
    /// Everything, including archived closed positions
    All,
}

/// Result of applying a fill
#[derive(Debug, Clone, PartialEq)]
pub struct FillOutcome {
    pub order: Order,
    pub position: Position,
    /// P&L realized by this fill (zero for buys)
    pub realized_pnl: Decimal,
}

/// Thread-safe order and position store
pub struct Ledger {
    orders: Arc<DashMap<OrderId, Order>>,
    /// Current position per key (open, or the last one closed)
    positions: Arc<DashMap<PositionKey, Position>>,
    /// Closed positions superseded by a re-opened one on the same key
    archived: Arc<DashMap<Uuid, Position>>,
    locks: Arc<KeyedLocks>,
    clock: Arc<dyn Clock>,
}

impl Clone for Ledger {
    fn clone(&self) -> Self {
        Self {
            orders: Arc::clone(&self.orders),
            positions: Arc::clone(&self.positions),
            archived: Arc::clone(&self.archived),
            locks: Arc::clone(&self.locks),
            clock: Arc::clone(&self.clock),
        }
    }
}

fn position_key(order: &Order) -> PositionKey {
    PositionKey::new(
        order.user_id.clone(),
        order.market_id.clone(),
        order.token_id.clone(),
        order.mode,
    )
}

fn invalid_state(order: &Order, action: &'static str) -> LedgerError {
    LedgerError::InvalidState {
        order_id: order.id,
        status: order.status,
        action,
    }
}

impl Ledger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            orders: Arc::new(DashMap::new()),
            positions: Arc::new(DashMap::new()),
            archived: Arc::new(DashMap::new()),
            locks: Arc::new(KeyedLocks::default()),
            clock,
        }
    }

    /// Current time according to the ledger's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Record a new order for `user_id` in `mode`
    pub fn record_order(
        &self,
        user_id: &str,
        intent: &OrderIntent,
        mode: ExecutionMode,
        initial: InitialState,
    ) -> Result<Order> {
        intent.validate()?;
        let now = self.clock.now();

        let status = match initial {
            InitialState::Pending => OrderStatus::Pending,
            InitialState::Open => OrderStatus::Open,
            InitialState::Filled(fill) => {
                return self.record_filled(user_id, intent, mode, &fill, now);
            }
        };

        let order = Order::from_intent(user_id, intent, mode, status, now);
        info!(
            "[LEDGER] Recorded {} {} {} {} x {} ({})",
            order.id, mode, order.side, order.token_id, order.size, status
        );
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    fn record_filled(
        &self,
        user_id: &str,
        intent: &OrderIntent,
        mode: ExecutionMode,
        fill: &Fill,
        now: DateTime<Utc>,
    ) -> Result<Order> {
        validate_fill(fill)?;
        let order = Order::from_intent(user_id, intent, mode, OrderStatus::Open, now);
        let key = position_key(&order);

        let lock = self.locks.for_key(&key);
        let _guard = lock.lock();

        if order.side == Side::Sell {
            self.ensure_sellable(&key, fill.size)?;
        }
        let order_id = order.id;
        self.orders.insert(order_id, order);
        let outcome = self.apply_fill_locked(order_id, &key, fill, now)?;
        Ok(outcome.order)
    }

    /// Apply a (partial) fill to an order and its position
    pub fn apply_fill(&self, order_id: OrderId, fill: &Fill) -> Result<FillOutcome> {
        validate_fill(fill)?;
        let key = position_key(&self.get_order(order_id)?);

        let lock = self.locks.for_key(&key);
        let _guard = lock.lock();

        self.apply_fill_locked(order_id, &key, fill, self.clock.now())
    }

    /// Caller must hold the lock for `key`
    fn apply_fill_locked(
        &self,
        order_id: OrderId,
        key: &PositionKey,
        fill: &Fill,
        now: DateTime<Utc>,
    ) -> Result<FillOutcome> {
        let mut order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| LedgerError::NotFound(format!("Order {}", order_id)))?;

        if !order.status.is_active() {
            return Err(invalid_state(&order, "fill"));
        }
        let filled_size = order.filled_size + fill.size;
        if filled_size > order.size {
            return Err(LedgerError::InvalidFill(format!(
                "fill of {} exceeds remaining size {}",
                fill.size,
                order.remaining_size()
            )));
        }
        let status = if filled_size >= order.size {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        if !order.status.can_transition_to(status) {
            return Err(invalid_state(&order, "fill"));
        }

        // Position first: a sell without a position must leave the order untouched
        let (position, realized_pnl) = match order.side {
            Side::Buy => (self.apply_buy(key, fill, now), Decimal::ZERO),
            Side::Sell => self.apply_sell(key, fill, now)?,
        };

        let prior_value = order.filled_value();
        order.filled_price = Some((prior_value + fill.notional()) / filled_size);
        order.slippage = (order.slippage * order.filled_size + fill.slippage * fill.size) / filled_size;
        order.filled_size = filled_size;
        order.fees += fill.fees;
        order.status = status;
        order.filled_at = Some(now);
        order.updated_at = now;

        info!(
            "[LEDGER] Order {} {}: {} @ {} (fees {}, {:?})",
            order.id, status, fill.size, fill.price, fill.fees, fill.liquidity
        );

        Ok(FillOutcome {
            order: order.clone(),
            position,
            realized_pnl,
        })
    }

    fn apply_buy(&self, key: &PositionKey, fill: &Fill, now: DateTime<Utc>) -> Position {
        if let Some(mut position) = self.positions.get_mut(key) {
            if position.is_closed() {
                let fresh = Position::open(key, fill.size, fill.price, now);
                let closed = std::mem::replace(&mut *position, fresh);
                debug!("[LEDGER] Archived closed position {}", closed.id);
                self.archived.insert(closed.id, closed);
            } else {
                position.increase(fill.size, fill.price, now);
            }
            return position.clone();
        }

        let position = Position::open(key, fill.size, fill.price, now);
        self.positions.insert(key.clone(), position.clone());
        position
    }

    fn apply_sell(
        &self,
        key: &PositionKey,
        fill: &Fill,
        now: DateTime<Utc>,
    ) -> Result<(Position, Decimal)> {
        let not_found = || LedgerError::NotFound(format!("Open position for {}", key.token_id));
        let mut position = self.positions.get_mut(key).ok_or_else(not_found)?;
        if position.is_closed() {
            return Err(not_found());
        }
        if fill.size > position.size {
            return Err(oversold(fill.size, position.size));
        }

        let pnl = position.decrease(fill.size, fill.price, now);
        if position.is_closed() {
            info!(
                "[LEDGER] Position {} closed, realized {}",
                position.id, position.realized_pnl
            );
        }
        Ok((position.clone(), pnl))
    }

    /// Second phase of a live submission: record the venue's acknowledgement
    pub fn confirm_order(
        &self,
        order_id: OrderId,
        external_id: Option<String>,
        status: OrderStatus,
    ) -> Result<Order> {
        let mut order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| LedgerError::NotFound(format!("Order {}", order_id)))?;

        if order.status != OrderStatus::Pending || !order.status.can_transition_to(status) {
            return Err(invalid_state(&order, "confirm"));
        }
        order.external_id = external_id;
        order.status = status;
        order.updated_at = self.clock.now();
        Ok(order.clone())
    }

    /// Mark a pending or open order as failed
    pub fn mark_failed(&self, order_id: OrderId, reason: &str) -> Result<Order> {
        let mut order = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| LedgerError::NotFound(format!("Order {}", order_id)))?;

        if !order.status.can_transition_to(OrderStatus::Failed) {
            return Err(invalid_state(&order, "fail"));
        }
        warn!("[LEDGER] Order {} failed: {}", order.id, reason);
        order.status = OrderStatus::Failed;
        order.error_message = Some(reason.to_string());
        order.updated_at = self.clock.now();
        Ok(order.clone())
    }

    /// Cancel an order; legal only from PENDING or OPEN
    pub fn cancel_order(
        &self,
        user_id: &str,
        mode: ExecutionMode,
        order_id: OrderId,
    ) -> Result<Order> {
        let mut order = self
            .orders
            .get_mut(&order_id)
            .filter(|o| o.user_id == user_id && o.mode == mode)
            .ok_or_else(|| LedgerError::NotFound(format!("Order {}", order_id)))?;

        if !order.status.is_cancellable() {
            return Err(invalid_state(&order, "cancel"));
        }
        let now = self.clock.now();
        order.status = OrderStatus::Cancelled;
        order.cancelled_at = Some(now);
        order.updated_at = now;
        info!("[LEDGER] Order {} cancelled", order.id);
        Ok(order.clone())
    }

    /// Expire working GTD orders whose expiry has passed
    pub fn expire_orders(&self, user_id: &str, mode: ExecutionMode, now: DateTime<Utc>) -> Vec<Order> {
        let mut expired = Vec::new();
        for mut order in self.orders.iter_mut() {
            if order.user_id == user_id
                && order.mode == mode
                && order.status.is_active()
                && order.is_expired_at(now)
            {
                order.status = OrderStatus::Expired;
                order.updated_at = now;
                info!("[LEDGER] Order {} expired", order.id);
                expired.push(order.clone());
            }
        }
        expired
    }

    /// Refresh the mark price of open positions in `token_id`
    pub fn update_mark_price(
        &self,
        user_id: &str,
        mode: ExecutionMode,
        token_id: &str,
        price: Decimal,
    ) -> usize {
        let now = self.clock.now();
        let mut updated = 0;
        for mut position in self.positions.iter_mut() {
            if position.user_id == user_id
                && position.mode == mode
                && position.token_id == token_id
                && !position.is_closed()
            {
                position.update_mark_price(price, now);
                updated += 1;
            }
        }
        updated
    }

    // ------------------------------------------------------------------
    // Read projections
    // ------------------------------------------------------------------

    pub fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .get(&order_id)
            .map(|o| o.value().clone())
            .ok_or_else(|| LedgerError::NotFound(format!("Order {}", order_id)))
    }

    /// All orders of (user, mode), oldest first
    pub fn list_orders(&self, user_id: &str, mode: ExecutionMode) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| o.user_id == user_id && o.mode == mode)
            .map(|o| o.value().clone())
            .collect();
        orders.sort_by_key(|o| o.created_at);
        orders
    }

    /// Pending, open and partially filled orders
    pub fn list_open_orders(&self, user_id: &str, mode: ExecutionMode) -> Vec<Order> {
        self.list_orders(user_id, mode)
            .into_iter()
            .filter(|o| o.is_open())
            .collect()
    }

    /// Orders with at least one fill, in fill-time order
    pub fn filled_orders(&self, user_id: &str, mode: ExecutionMode) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .list_orders(user_id, mode)
            .into_iter()
            .filter(|o| o.filled_size > Decimal::ZERO && o.filled_at.is_some())
            .collect();
        orders.sort_by_key(|o| o.filled_at);
        orders
    }

    pub fn list_positions(
        &self,
        user_id: &str,
        mode: ExecutionMode,
        filter: PositionFilter,
    ) -> Vec<Position> {
        let in_scope = |p: &Position| p.user_id == user_id && p.mode == mode;
        let wanted = |p: &Position| match filter {
            PositionFilter::Open => !p.is_closed(),
            PositionFilter::Closed => p.is_closed(),
            PositionFilter::All => true,
        };

        let mut positions: Vec<Position> = self
            .positions
            .iter()
            .map(|p| p.value().clone())
            .chain(self.archived.iter().map(|p| p.value().clone()))
            .filter(|p| in_scope(p) && wanted(p))
            .collect();
        positions.sort_by_key(|p| p.opened_at);
        positions
    }

    /// Mark-to-market value of open positions
    pub fn open_exposure(&self, user_id: &str, mode: ExecutionMode) -> Decimal {
        self.list_positions(user_id, mode, PositionFilter::Open)
            .iter()
            .map(Position::market_value)
            .sum()
    }

    /// Cash projection from a starting balance
    ///
    /// available = initial + net cash flow of fills - cash reserved by
    /// working BUY orders
    pub fn compute_balance(
        &self,
        user_id: &str,
        mode: ExecutionMode,
        initial_balance: Decimal,
    ) -> Balance {
        let orders = self.list_orders(user_id, mode);

        let cash: Decimal = initial_balance + orders.iter().map(Order::cash_flow).sum::<Decimal>();
        let in_orders: Decimal = orders
            .iter()
            .filter(|o| o.is_open() && o.side == Side::Buy)
            .map(|o| o.remaining_size() * o.price.unwrap_or(Decimal::ZERO))
            .sum();
        let in_positions = self.open_exposure(user_id, mode);

        Balance::new(cash - in_orders, in_orders, in_positions)
    }

    /// Check that a SELL intent is covered by the open position
    ///
    /// Fails with `NotFound` when nothing is held and `InvalidFill` when
    /// the intent is larger than the held size. Mutates nothing.
    pub fn check_sell(&self, user_id: &str, mode: ExecutionMode, intent: &OrderIntent) -> Result<()> {
        let key = PositionKey::new(
            user_id.to_string(),
            intent.market_id.clone(),
            intent.token_id.clone(),
            mode,
        );
        self.ensure_sellable(&key, intent.size)
    }

    fn ensure_sellable(&self, key: &PositionKey, size: Decimal) -> Result<()> {
        let held = self
            .positions
            .get(key)
            .filter(|p| !p.is_closed())
            .map(|p| p.size)
            .ok_or_else(|| LedgerError::NotFound(format!("Open position for {}", key.token_id)))?;
        if size > held {
            return Err(oversold(size, held));
        }
        Ok(())
    }
}

fn oversold(size: Decimal, held: Decimal) -> LedgerError {
    LedgerError::InvalidFill(format!("sell of {} exceeds open position {}", size, held))
}

fn validate_fill(fill: &Fill) -> Result<()> {
    if fill.size <= Decimal::ZERO {
        return Err(LedgerError::InvalidFill(format!(
            "size must be positive, got {}",
            fill.size
        )));
    }
    if fill.price < Decimal::ZERO {
        return Err(LedgerError::InvalidFill(format!(
            "price must not be negative, got {}",
            fill.price
        )));
    }
    if fill.fees < Decimal::ZERO {
        return Err(LedgerError::InvalidFill(format!(
            "fees must not be negative, got {}",
            fill.fees
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_clock::ManualClock;
    use meridian_core::Liquidity;
    use rust_decimal_macros::dec;

    fn ledger() -> Ledger {
        Ledger::new(Arc::new(ManualClock::frozen_now()))
    }

    fn taker(size: Decimal, price: Decimal) -> Fill {
        Fill {
            size,
            price,
            fees: Decimal::ZERO,
            slippage: Decimal::ZERO,
            liquidity: Liquidity::Taker,
        }
    }

    fn buy(size: Decimal) -> OrderIntent {
        OrderIntent::market("m1", "yes", Side::Buy, size)
    }

    fn sell(size: Decimal) -> OrderIntent {
        OrderIntent::market("m1", "yes", Side::Sell, size)
    }

    #[test]
    fn test_record_open_order() {
        let ledger = ledger();
        let intent = OrderIntent::limit("m1", "yes", Side::Buy, dec!(10), dec!(0.5));
        let order = ledger
            .record_order("u1", &intent, ExecutionMode::Paper, InitialState::Open)
            .unwrap();

        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(ledger.list_open_orders("u1", ExecutionMode::Paper).len(), 1);
        assert!(ledger.list_open_orders("u1", ExecutionMode::Live).is_empty());
    }

    #[test]
    fn test_record_rejects_invalid_intent() {
        let ledger = ledger();
        let result = ledger.record_order("u1", &buy(dec!(-1)), ExecutionMode::Paper, InitialState::Open);
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_partial_then_full_fill() {
        let ledger = ledger();
        let order = ledger
            .record_order("u1", &buy(dec!(10)), ExecutionMode::Paper, InitialState::Open)
            .unwrap();

        let first = ledger.apply_fill(order.id, &taker(dec!(4), dec!(0.50))).unwrap();
        assert_eq!(first.order.status, OrderStatus::PartiallyFilled);

        let second = ledger.apply_fill(order.id, &taker(dec!(6), dec!(0.60))).unwrap();
        assert_eq!(second.order.status, OrderStatus::Filled);
        assert_eq!(second.order.filled_size, dec!(10));
        // (4 * 0.50 + 6 * 0.60) / 10 = 0.56
        assert_eq!(second.order.filled_price, Some(dec!(0.56)));
        assert_eq!(second.position.avg_entry_price, dec!(0.56));
    }

    #[test]
    fn test_overfill_rejected() {
        let ledger = ledger();
        let order = ledger
            .record_order("u1", &buy(dec!(5)), ExecutionMode::Paper, InitialState::Open)
            .unwrap();

        let result = ledger.apply_fill(order.id, &taker(dec!(6), dec!(0.5)));
        assert!(matches!(result, Err(LedgerError::InvalidFill(_))));
        assert_eq!(ledger.get_order(order.id).unwrap().filled_size, Decimal::ZERO);
    }

    #[test]
    fn test_fill_after_terminal_rejected() {
        let ledger = ledger();
        let order = ledger
            .record_order(
                "u1",
                &buy(dec!(5)),
                ExecutionMode::Paper,
                InitialState::Filled(taker(dec!(5), dec!(0.5))),
            )
            .unwrap();

        let result = ledger.apply_fill(order.id, &taker(dec!(1), dec!(0.5)));
        assert!(matches!(result, Err(LedgerError::InvalidState { .. })));
    }

    #[test]
    fn test_sell_without_position_is_not_found() {
        let ledger = ledger();
        let order = ledger
            .record_order("u1", &sell(dec!(5)), ExecutionMode::Paper, InitialState::Open)
            .unwrap();

        let result = ledger.apply_fill(order.id, &taker(dec!(5), dec!(0.5)));
        assert!(matches!(result, Err(LedgerError::NotFound(_))));
        assert_eq!(ledger.get_order(order.id).unwrap().status, OrderStatus::Open);

        let immediate = ledger.record_order(
            "u1",
            &sell(dec!(5)),
            ExecutionMode::Paper,
            InitialState::Filled(taker(dec!(5), dec!(0.5))),
        );
        assert!(matches!(immediate, Err(LedgerError::NotFound(_))));
    }

    #[test]
    fn test_sell_larger_than_position_is_rejected() {
        let ledger = ledger();
        let mode = ExecutionMode::Paper;
        ledger
            .record_order("u1", &buy(dec!(10)), mode, InitialState::Filled(taker(dec!(10), dec!(0.5))))
            .unwrap();

        assert!(ledger.check_sell("u1", mode, &sell(dec!(10))).is_ok());
        assert!(matches!(
            ledger.check_sell("u1", mode, &sell(dec!(11))),
            Err(LedgerError::InvalidFill(_))
        ));
        assert!(matches!(
            ledger.check_sell("u1", ExecutionMode::Live, &sell(dec!(1))),
            Err(LedgerError::NotFound(_))
        ));

        let immediate = ledger.record_order(
            "u1",
            &sell(dec!(1000)),
            mode,
            InitialState::Filled(taker(dec!(1000), dec!(0.5))),
        );
        assert!(matches!(immediate, Err(LedgerError::InvalidFill(_))));
        // Nothing recorded, nothing realized
        assert_eq!(ledger.list_orders("u1", mode).len(), 1);

        let resting = ledger
            .record_order("u1", &sell(dec!(15)), mode, InitialState::Open)
            .unwrap();
        let result = ledger.apply_fill(resting.id, &taker(dec!(15), dec!(0.6)));
        assert!(matches!(result, Err(LedgerError::InvalidFill(_))));
        assert_eq!(ledger.get_order(resting.id).unwrap().filled_size, Decimal::ZERO);

        let position = &ledger.list_positions("u1", mode, PositionFilter::Open)[0];
        assert_eq!(position.size, dec!(10));
        assert_eq!(position.realized_pnl, Decimal::ZERO);
    }

    #[test]
    fn test_cancel_only_from_pending_or_open() {
        let ledger = ledger();
        let open = ledger
            .record_order("u1", &buy(dec!(5)), ExecutionMode::Paper, InitialState::Open)
            .unwrap();
        let cancelled = ledger.cancel_order("u1", ExecutionMode::Paper, open.id).unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());

        let filled = ledger
            .record_order(
                "u1",
                &buy(dec!(5)),
                ExecutionMode::Paper,
                InitialState::Filled(taker(dec!(5), dec!(0.5))),
            )
            .unwrap();
        let result = ledger.cancel_order("u1", ExecutionMode::Paper, filled.id);
        assert!(matches!(
            result,
            Err(LedgerError::InvalidState {
                status: OrderStatus::Filled,
                ..
            })
        ));
    }

    #[test]
    fn test_cancel_is_scoped_to_user_and_mode() {
        let ledger = ledger();
        let order = ledger
            .record_order("u1", &buy(dec!(5)), ExecutionMode::Paper, InitialState::Open)
            .unwrap();

        assert!(matches!(
            ledger.cancel_order("u2", ExecutionMode::Paper, order.id),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            ledger.cancel_order("u1", ExecutionMode::Live, order.id),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_two_phase_confirm_and_fail() {
        let ledger = ledger();
        let pending = ledger
            .record_order("u1", &buy(dec!(5)), ExecutionMode::Live, InitialState::Pending)
            .unwrap();

        let confirmed = ledger
            .confirm_order(pending.id, Some("ext-1".to_string()), OrderStatus::Open)
            .unwrap();
        assert_eq!(confirmed.external_id.as_deref(), Some("ext-1"));

        // Already confirmed
        assert!(ledger.confirm_order(pending.id, None, OrderStatus::Open).is_err());

        let other = ledger
            .record_order("u1", &buy(dec!(5)), ExecutionMode::Live, InitialState::Pending)
            .unwrap();
        let failed = ledger.mark_failed(other.id, "insufficient balance").unwrap();
        assert_eq!(failed.status, OrderStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("insufficient balance"));
    }

    #[test]
    fn test_reopen_archives_closed_position() {
        let ledger = ledger();
        let mode = ExecutionMode::Paper;
        ledger
            .record_order("u1", &buy(dec!(10)), mode, InitialState::Filled(taker(dec!(10), dec!(0.4))))
            .unwrap();
        ledger
            .record_order("u1", &sell(dec!(10)), mode, InitialState::Filled(taker(dec!(10), dec!(0.5))))
            .unwrap();
        ledger
            .record_order("u1", &buy(dec!(3)), mode, InitialState::Filled(taker(dec!(3), dec!(0.7))))
            .unwrap();

        let open = ledger.list_positions("u1", mode, PositionFilter::Open);
        let closed = ledger.list_positions("u1", mode, PositionFilter::Closed);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].avg_entry_price, dec!(0.7));
        assert_eq!(open[0].realized_pnl, Decimal::ZERO);
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].realized_pnl, dec!(1.0));
        assert_eq!(ledger.list_positions("u1", mode, PositionFilter::All).len(), 2);
    }

    #[test]
    fn test_expire_gtd_orders() {
        let clock = ManualClock::frozen_now();
        let ledger = Ledger::new(Arc::new(clock.clone()));
        let expiry = clock.now() + chrono::Duration::minutes(10);
        let intent = OrderIntent::limit("m1", "yes", Side::Buy, dec!(5), dec!(0.3))
            .with_type(meridian_core::OrderType::Gtd)
            .with_expiry(expiry);
        let order = ledger
            .record_order("u1", &intent, ExecutionMode::Paper, InitialState::Open)
            .unwrap();

        assert!(ledger.expire_orders("u1", ExecutionMode::Paper, clock.now()).is_empty());

        clock.advance(chrono::Duration::minutes(10));
        let expired = ledger.expire_orders("u1", ExecutionMode::Paper, clock.now());
        assert_eq!(expired.len(), 1);
        assert_eq!(ledger.get_order(order.id).unwrap().status, OrderStatus::Expired);
    }

    #[test]
    fn test_mark_price_drives_exposure() {
        let ledger = ledger();
        let mode = ExecutionMode::Paper;
        ledger
            .record_order("u1", &buy(dec!(100)), mode, InitialState::Filled(taker(dec!(100), dec!(0.4))))
            .unwrap();
        assert_eq!(ledger.open_exposure("u1", mode), dec!(40));

        assert_eq!(ledger.update_mark_price("u1", mode, "yes", dec!(0.6)), 1);
        assert_eq!(ledger.open_exposure("u1", mode), dec!(60));
    }
}
