//! Quote Feed - scripted market data for paper/shadow sessions
//!
//! A seeded random walk of the midpoint of one outcome token, moved in
//! whole price ticks and kept inside (0, 1). The same seed always produces
//! the same quotes, so a session replays exactly.

use meridian_broker::adapters::StaticMarketData;
use meridian_core::Quote;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Random walk parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub initial_midpoint: Decimal,
    /// Price increment of one step
    pub tick_size: Decimal,
    /// Largest move per update, in ticks
    pub max_steps: i64,
    pub half_spread: Decimal,
    pub min_volume: u32,
    pub max_volume: u32,
    pub seed: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            initial_midpoint: dec!(0.50),
            tick_size: dec!(0.01),
            max_steps: 3,
            half_spread: dec!(0.01),
            min_volume: 50,
            max_volume: 500,
            seed: 7,
        }
    }
}

pub struct QuoteFeed {
    token_id: String,
    midpoint: Decimal,
    config: FeedConfig,
    rng: StdRng,
}

impl QuoteFeed {
    pub fn new(token_id: impl Into<String>, config: FeedConfig) -> Self {
        Self {
            token_id: token_id.into(),
            midpoint: config.initial_midpoint,
            rng: StdRng::seed_from_u64(config.seed),
            config,
        }
    }

    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    pub fn midpoint(&self) -> Decimal {
        self.midpoint
    }

    /// Step the walk and return the new quote
    pub fn next_quote(&mut self) -> Quote {
        let steps = self
            .rng
            .gen_range(-self.config.max_steps..=self.config.max_steps);
        let floor = self.config.half_spread + self.config.tick_size;
        let ceiling = Decimal::ONE - floor;
        self.midpoint = (self.midpoint + Decimal::from(steps) * self.config.tick_size)
            .max(floor)
            .min(ceiling);

        let volume = self
            .rng
            .gen_range(self.config.min_volume..=self.config.max_volume);
        Quote::new(
            self.midpoint - self.config.half_spread,
            self.midpoint + self.config.half_spread,
            Decimal::from(volume),
        )
    }

    /// Step the walk and publish the quote to the market data source
    pub fn tick(&mut self, market: &StaticMarketData) -> Quote {
        let quote = self.next_quote();
        market.set_quote(&self.token_id, quote.clone());
        quote
    }
}
