//! Spread-Capturing Market Maker
//!
//! Rests a BUY below and a SELL above the midpoint of every quoted outcome:
//! - quotes sit `spread_percent` of the midpoint away on each side
//! - never tighter than the market's own spread
//! - buys only while under `max_position` and cash covers the bid
//! - offers at most what it holds
//! - one resting order per side, so quotes do not pile up

use log::{debug, info};
use meridian_core::{MarketState, OrderIntent, Side};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::strategy::{self, Parameters, Strategy, StrategyContext, merge_parameters};

/// Configuration for the market maker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketMakerConfig {
    /// Markets to quote, every market in the context when empty
    pub market_ids: Vec<String>,
    /// Offset of each quote from the midpoint, as a fraction of it
    pub spread_percent: Decimal,
    /// Tokens per quote
    pub order_size: Decimal,
    /// Largest position held per outcome
    pub max_position: Decimal,
    /// Relative midpoint move logged as a stale quote
    pub refresh_threshold: Decimal,
    pub min_price: Decimal,
    pub max_price: Decimal,
}

impl Default for MarketMakerConfig {
    fn default() -> Self {
        Self {
            market_ids: Vec::new(),
            spread_percent: dec!(0.02),
            order_size: dec!(10),
            max_position: dec!(100),
            refresh_threshold: dec!(0.01),
            min_price: dec!(0.01),
            max_price: dec!(0.99),
        }
    }
}

pub struct MarketMaker {
    config: MarketMakerConfig,
    /// Last midpoint seen per market
    last_mid: HashMap<String, Decimal>,
}

impl MarketMaker {
    pub fn new(config: MarketMakerConfig) -> Self {
        Self {
            config,
            last_mid: HashMap::new(),
        }
    }

    pub fn config(&self) -> &MarketMakerConfig {
        &self.config
    }

    /// Bid and ask around the midpoint, at least as wide as the market
    fn quote_prices(&self, market: &MarketState) -> (Decimal, Decimal) {
        let mid = market.midpoint;
        let mut bid = mid * (Decimal::ONE - self.config.spread_percent);
        let mut ask = mid * (Decimal::ONE + self.config.spread_percent);

        if ask - bid < market.spread {
            let half = market.spread / dec!(2);
            bid = mid - half;
            ask = mid + half;
        }
        (bid.round_dp(4), ask.round_dp(4))
    }

    /// Relative move since the previous tick
    fn price_change(&self, market_id: &str, midpoint: Decimal) -> Option<Decimal> {
        let last = *self.last_mid.get(market_id)?;
        if last.is_zero() {
            return None;
        }
        Some((midpoint - last).abs() / last)
    }

    fn quotes_market(&self, market_id: &str) -> bool {
        self.config.market_ids.is_empty() || self.config.market_ids.iter().any(|m| m == market_id)
    }

    fn quote(&self, market: &MarketState, ctx: &StrategyContext) -> Vec<OrderIntent> {
        let mut orders = Vec::new();
        let held = ctx.held(&market.market_id, &market.token_id);
        let (bid, ask) = self.quote_prices(market);

        if held < self.config.max_position && ctx.orders_for(&market.token_id, Side::Buy).is_empty()
        {
            let size = self.config.order_size.min(self.config.max_position - held);
            if size > Decimal::ZERO && ctx.balance.available >= size * bid {
                orders.push(strategy::buy(market, size, bid));
            }
        }

        if held > Decimal::ZERO && ctx.orders_for(&market.token_id, Side::Sell).is_empty() {
            let size = self.config.order_size.min(held);
            orders.push(OrderIntent::limit(
                &market.market_id,
                &market.token_id,
                Side::Sell,
                size,
                ask,
            ));
        }
        orders
    }
}

impl Strategy for MarketMaker {
    fn name(&self) -> &str {
        "MarketMaker"
    }

    fn initialize(&mut self, parameters: &Parameters) -> strategy::Result<()> {
        self.config = merge_parameters(&self.config, parameters)?;
        info!(
            "[STRATEGY] Market maker initialized: spread={}, size={}, max={}",
            self.config.spread_percent, self.config.order_size, self.config.max_position
        );
        Ok(())
    }

    fn on_tick(&mut self, market: &MarketState) {
        if let Some(change) = self.price_change(&market.market_id, market.midpoint) {
            if change > self.config.refresh_threshold {
                info!(
                    "[STRATEGY] {} moved {:.1}% - quotes may need refresh",
                    market.market_id,
                    change * dec!(100)
                );
            }
        }
        self.last_mid
            .insert(market.market_id.clone(), market.midpoint);
    }

    fn propose_orders(&mut self, ctx: &StrategyContext) -> Vec<OrderIntent> {
        let orders: Vec<OrderIntent> = ctx
            .market_data
            .values()
            .filter(|m| self.quotes_market(&m.market_id))
            .flat_map(|m| self.quote(m, ctx))
            .collect();
        debug!("[STRATEGY] {} proposing {} orders", ctx.mode, orders.len());
        orders
    }

    fn risk_check(&self, order: &OrderIntent, ctx: &StrategyContext) -> bool {
        let held = ctx.held(&order.market_id, &order.token_id);
        match order.side {
            Side::Buy if held + order.size > self.config.max_position => {
                info!(
                    "[STRATEGY] Risk check failed: would exceed max position {}",
                    self.config.max_position
                );
                return false;
            }
            Side::Sell if order.size > held => {
                info!("[STRATEGY] Risk check failed: sell size {} > position {}", order.size, held);
                return false;
            }
            _ => {}
        }

        // Market orders carry no price to check
        if let Some(price) = order.price {
            if price < self.config.min_price || price > self.config.max_price {
                info!("[STRATEGY] Risk check failed: price {} out of range", price);
                return false;
            }
        }
        true
    }
}
