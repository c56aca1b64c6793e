//! Strategy Trait and Context
//!
//! Defines the lifecycle a session drives a strategy through:
//!
//! ```text
//!   initialize(parameters)            once, before the first tick
//!   on_tick(market)                   every quote update, per market
//!   propose_orders(ctx) ─► intents
//!   risk_check(intent, ctx)           per intent, false drops it
//! ```
//!
//! Strategies only propose. Placement, the risk gate and the ledger stay in
//! the broker the session owns.

use meridian_core::{Balance, ExecutionMode, MarketState, Order, OrderIntent, Position, Side};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::market_maker::{MarketMaker, MarketMakerConfig};
use crate::mean_reversion::{MeanReversion, MeanReversionConfig};

/// Free-form strategy parameters, keyed by name
pub type Parameters = Map<String, Value>;

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Invalid strategy parameters: {0}")]
    InvalidParameters(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StrategyError>;

/// Snapshot of one book handed to a strategy
#[derive(Debug, Clone)]
pub struct StrategyContext {
    pub mode: ExecutionMode,
    /// Open positions only
    pub positions: Vec<Position>,
    pub open_orders: Vec<Order>,
    pub balance: Balance,
    /// Latest state per market id
    pub market_data: BTreeMap<String, MarketState>,
    pub parameters: Parameters,
}

impl StrategyContext {
    pub fn market(&self, market_id: &str) -> Option<&MarketState> {
        self.market_data.get(market_id)
    }

    /// Tokens held in an outcome (zero when flat)
    pub fn held(&self, market_id: &str, token_id: &str) -> Decimal {
        self.positions
            .iter()
            .filter(|p| p.market_id == market_id && p.token_id == token_id)
            .map(|p| p.size)
            .sum()
    }

    /// Open orders resting on one side of an outcome
    pub fn orders_for(&self, token_id: &str, side: Side) -> Vec<&Order> {
        self.open_orders
            .iter()
            .filter(|o| o.token_id == token_id && o.side == side)
            .collect()
    }
}

/// Strategy trait - implement this for your trading strategy
pub trait Strategy: Send {
    /// Strategy name for logging
    fn name(&self) -> &str;

    /// Apply parameter overrides before the first tick (optional)
    fn initialize(&mut self, _parameters: &Parameters) -> Result<()> {
        Ok(())
    }

    /// Called with every quote update (optional)
    fn on_tick(&mut self, _market: &MarketState) {}

    /// Orders to place against the book described by `ctx`
    fn propose_orders(&mut self, ctx: &StrategyContext) -> Vec<OrderIntent>;

    /// Last veto before an intent reaches the broker (optional)
    fn risk_check(&self, _order: &OrderIntent, _ctx: &StrategyContext) -> bool {
        true
    }
}

/// Which strategy a session runs, with its settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    MeanReversion(MeanReversionConfig),
    MarketMaker(MarketMakerConfig),
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::MeanReversion(MeanReversionConfig::default())
    }
}

impl StrategyConfig {
    pub fn build(&self) -> Box<dyn Strategy> {
        match self {
            StrategyConfig::MeanReversion(config) => Box::new(MeanReversion::new(config.clone())),
            StrategyConfig::MarketMaker(config) => Box::new(MarketMaker::new(config.clone())),
        }
    }
}

/// LIMIT BUY of `size` tokens at `price`
pub fn buy(market: &MarketState, size: Decimal, price: Decimal) -> OrderIntent {
    OrderIntent::limit(&market.market_id, &market.token_id, Side::Buy, size, price)
}

/// MARKET SELL of `size` tokens
pub fn sell(market: &MarketState, size: Decimal) -> OrderIntent {
    OrderIntent::market(&market.market_id, &market.token_id, Side::Sell, size)
}

/// Overlay `parameters` on a config, ignoring names it does not have
pub fn merge_parameters<T>(config: &T, parameters: &Parameters) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut fields = match serde_json::to_value(config)? {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    for (name, value) in parameters {
        if let Some(field) = fields.get_mut(name) {
            *field = value.clone();
        }
    }
    Ok(serde_json::from_value(Value::Object(fields))?)
}
