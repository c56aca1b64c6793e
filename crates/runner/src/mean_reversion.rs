//! Mean Reversion Strategy
//!
//! Trades the midpoint back towards a fair value:
//! - mid at or below `fair - entry_threshold`: market BUY `order_size`
//! - mid at or above `fair + exit_threshold` while holding: market SELL all
//! - every `limit_every` ticks otherwise: LIMIT BUY `limit_offset` below the bid
//!
//! Fair value is fixed by config, or anchored on the first midpoint seen.

use log::debug;
use meridian_core::{MarketState, OrderIntent, Side};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::strategy::{self, Parameters, Strategy, StrategyContext, merge_parameters};

/// Configuration for mean reversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanReversionConfig {
    pub order_size: Decimal,
    /// Largest position the strategy builds
    pub max_holding: Decimal,
    pub entry_threshold: Decimal,
    pub exit_threshold: Decimal,
    /// Place a resting limit every N ticks (0 disables)
    pub limit_every: usize,
    /// Distance below the bid for resting limits
    pub limit_offset: Decimal,
    pub fair_value: Option<Decimal>,
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        Self {
            order_size: dec!(20),
            max_holding: dec!(100),
            entry_threshold: dec!(0.03),
            exit_threshold: dec!(0.03),
            limit_every: 10,
            limit_offset: dec!(0.02),
            fair_value: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Track {
    fair: Decimal,
    ticks: usize,
}

pub struct MeanReversion {
    config: MeanReversionConfig,
    tracks: HashMap<String, Track>,
}

impl MeanReversion {
    pub fn new(config: MeanReversionConfig) -> Self {
        Self {
            config,
            tracks: HashMap::new(),
        }
    }

    pub fn config(&self) -> &MeanReversionConfig {
        &self.config
    }

    fn decide(&self, market: &MarketState, track: Track, held: Decimal) -> Option<OrderIntent> {
        let cfg = &self.config;
        let mid = market.midpoint;

        if mid >= track.fair + cfg.exit_threshold && held > Decimal::ZERO {
            return Some(strategy::sell(market, held));
        }
        if held + cfg.order_size > cfg.max_holding {
            return None;
        }
        if mid <= track.fair - cfg.entry_threshold {
            return Some(OrderIntent::market(
                &market.market_id,
                &market.token_id,
                Side::Buy,
                cfg.order_size,
            ));
        }
        // The first tick counts as tick zero
        let tick = track.ticks.saturating_sub(1);
        if cfg.limit_every > 0 && tick % cfg.limit_every == 0 {
            let price = (market.bid - cfg.limit_offset).round_dp(2);
            if price > Decimal::ZERO {
                return Some(strategy::buy(market, cfg.order_size, price));
            }
        }
        None
    }
}

impl Strategy for MeanReversion {
    fn name(&self) -> &str {
        "MeanReversion"
    }

    fn initialize(&mut self, parameters: &Parameters) -> strategy::Result<()> {
        self.config = merge_parameters(&self.config, parameters)?;
        Ok(())
    }

    fn on_tick(&mut self, market: &MarketState) {
        let fair = self.config.fair_value.unwrap_or(market.midpoint);
        let track = self
            .tracks
            .entry(market.market_id.clone())
            .or_insert(Track { fair, ticks: 0 });
        track.ticks += 1;
    }

    fn propose_orders(&mut self, ctx: &StrategyContext) -> Vec<OrderIntent> {
        let mut orders = Vec::new();
        for market in ctx.market_data.values() {
            let Some(track) = self.tracks.get(&market.market_id).copied() else {
                debug!("[STRATEGY] No tick seen for {}", market.market_id);
                continue;
            };
            let held = ctx.held(&market.market_id, &market.token_id);
            orders.extend(self.decide(market, track, held));
        }
        orders
    }
}
