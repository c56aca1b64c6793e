//! Execution Simulator
//!
//! Converts an order intent plus a quote into a simulated fill. Pure: no
//! I/O and no mutation, so every path can be driven with synthetic quotes.

use log::{debug, warn};
use meridian_core::{Fill, Liquidity, Order, OrderIntent, Quote, Side};
use meridian_ports::DataSourceError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::fees::FeeSchedule;
use crate::slippage::{SlippageConfig, SlippageModel};

/// Quote used when the market data source fails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackQuote {
    pub bid: Decimal,
    pub ask: Decimal,
    pub volume: Decimal,
}

impl Default for FallbackQuote {
    fn default() -> Self {
        let quote = Quote::fallback();
        Self {
            bid: quote.bid,
            ask: quote.ask,
            volume: quote.volume,
        }
    }
}

/// Simulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub slippage: SlippageConfig,
    pub fees: FeeSchedule,
    /// Liquidity estimate per unit of quoted volume
    pub liquidity_multiplier: Decimal,
    pub fallback_quote: FallbackQuote,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            slippage: SlippageConfig::default(),
            fees: FeeSchedule::default(),
            liquidity_multiplier: dec!(100),
            fallback_quote: FallbackQuote::default(),
        }
    }
}

/// Quote after fallback resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuote {
    pub quote: Quote,
    pub is_fallback: bool,
}

/// Outcome of simulating an order against a quote
#[derive(Debug, Clone, PartialEq)]
pub enum SimulatedExecution {
    /// Executed immediately
    Filled(Fill),
    /// Limit order that does not cross; rests with zero fill
    Resting,
}

/// Deterministic fill simulator
#[derive(Clone)]
pub struct ExecutionSimulator {
    slippage: Box<dyn SlippageModel>,
    fees: FeeSchedule,
    liquidity_multiplier: Decimal,
    fallback: Quote,
}

impl ExecutionSimulator {
    pub fn new(config: &ExecutionConfig) -> Self {
        let fallback = &config.fallback_quote;
        Self {
            slippage: config.slippage.build(),
            fees: config.fees.clone(),
            liquidity_multiplier: config.liquidity_multiplier,
            fallback: Quote::new(fallback.bid, fallback.ask, fallback.volume),
        }
    }

    /// Simulator with an explicit model and fees, other settings default
    pub fn with_model(slippage: Box<dyn SlippageModel>, fees: FeeSchedule) -> Self {
        Self {
            slippage,
            fees,
            ..Self::new(&ExecutionConfig::default())
        }
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    pub fn slippage_model(&self) -> &str {
        self.slippage.name()
    }

    /// Apply the fallback quote when the data source failed
    pub fn resolve_quote(
        &self,
        token_id: &str,
        result: Result<Quote, DataSourceError>,
    ) -> ResolvedQuote {
        match result {
            Ok(quote) => ResolvedQuote {
                quote,
                is_fallback: false,
            },
            Err(e) => {
                warn!(
                    "[EXEC] Market data unavailable for {}, using fallback quote: {}",
                    token_id, e
                );
                ResolvedQuote {
                    quote: self.fallback.clone(),
                    is_fallback: true,
                }
            }
        }
    }

    /// Liquidity from the quote, estimated from volume when not reported
    pub fn estimate_liquidity(&self, quote: &Quote) -> Decimal {
        quote
            .liquidity
            .unwrap_or(quote.volume * self.liquidity_multiplier)
    }

    /// Price an aggressive order starts from: ask for buys, bid for sells
    pub fn base_price(side: Side, quote: &Quote) -> Decimal {
        match side {
            Side::Buy => quote.ask,
            Side::Sell => quote.bid,
        }
    }

    /// Price used to value an intent for risk checks
    pub fn reference_price(intent: &OrderIntent, quote: &Quote) -> Decimal {
        intent
            .price
            .unwrap_or_else(|| Self::base_price(intent.side, quote))
    }

    /// Simulate an intent against a quote
    pub fn simulate(&self, intent: &OrderIntent, quote: &Quote) -> SimulatedExecution {
        let base = Self::base_price(intent.side, quote);

        if intent.order_type.is_market_type() {
            return SimulatedExecution::Filled(self.taker_fill(intent.side, intent.size, base, None, quote));
        }

        let Some(limit) = intent.price else {
            return SimulatedExecution::Resting;
        };
        if crosses(intent.side, limit, quote) {
            SimulatedExecution::Filled(self.taker_fill(intent.side, intent.size, base, Some(limit), quote))
        } else {
            debug!(
                "[EXEC] {} limit {} on {} does not cross (bid {}, ask {}), resting",
                intent.side, limit, intent.token_id, quote.bid, quote.ask
            );
            SimulatedExecution::Resting
        }
    }

    /// Fill a resting limit order once the quote has moved through it
    ///
    /// Executes the remaining size at the limit price with the maker fee.
    pub fn fill_resting(&self, order: &Order, quote: &Quote) -> Option<Fill> {
        if !order.is_open() || order.order_type.is_market_type() {
            return None;
        }
        let limit = order.price?;
        if !crosses(order.side, limit, quote) {
            return None;
        }

        let size = order.remaining_size();
        Some(Fill {
            size,
            price: limit,
            fees: self.fees.calculate_fee(size, limit, Liquidity::Maker),
            slippage: Decimal::ZERO,
            liquidity: Liquidity::Maker,
        })
    }

    fn taker_fill(
        &self,
        side: Side,
        size: Decimal,
        base: Decimal,
        limit: Option<Decimal>,
        quote: &Quote,
    ) -> Fill {
        let liquidity = self.estimate_liquidity(quote);
        let slip = self.slippage.slippage(base, size, liquidity);

        let mut price = match side {
            Side::Buy => base + slip,
            Side::Sell => (base - slip).max(Decimal::ZERO),
        };
        // Never worse than the limit
        if let Some(limit) = limit {
            price = match side {
                Side::Buy => price.min(limit),
                Side::Sell => price.max(limit),
            };
        }

        Fill {
            size,
            price,
            fees: self.fees.calculate_fee(size, price, Liquidity::Taker),
            slippage: (price - base).abs(),
            liquidity: Liquidity::Taker,
        }
    }
}

/// A buy crosses at or above the ask, a sell at or below the bid
fn crosses(side: Side, limit: Decimal, quote: &Quote) -> bool {
    match side {
        Side::Buy => limit >= quote.ask,
        Side::Sell => limit <= quote.bid,
    }
}
