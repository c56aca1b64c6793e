//! Trading Session - paper and shadow books driven by one strategy
//!
//! Each tick publishes a fresh quote and lets resting paper orders fill.
//! Then, for each broker, its own instance of the configured strategy sees
//! the tick, proposes orders against a snapshot of that book, and vetoes
//! any it dislikes before they reach the broker.
//!
//! Time is simulated with a manual clock, so a session of any length runs
//! instantly and replays exactly for a given feed seed.

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use meridian_analytics::{AnalyticsError, AnalyticsService, DailyMetrics, PerformanceMetrics};
use meridian_broker::adapters::{LogAuditSink, StaticMarketData};
use meridian_broker::{
    Broker, BrokerError, BrokerFactory, MeridianConfig, OrderResult, PaperBroker, ShadowBroker,
    ShadowComparison,
};
use meridian_clock::{Clock, ManualClock, SystemClock};
use meridian_core::{Balance, MarketState, Order, Position};
use meridian_ledger::PositionFilter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::feed::{FeedConfig, QuoteFeed};
use crate::strategy::{Parameters, Strategy, StrategyConfig, StrategyContext, StrategyError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Session and strategy settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub user_id: String,
    pub market_id: String,
    pub token_id: String,
    /// Simulated start time, now when unset
    pub start: Option<DateTime<Utc>>,
    pub ticks: usize,
    /// Simulated time between ticks
    pub tick_interval_secs: i64,
    pub strategy: StrategyConfig,
    /// Handed to `Strategy::initialize` and exposed in every context
    pub parameters: Parameters,
    pub feed: FeedConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id: "runner".to_string(),
            market_id: "demo-market".to_string(),
            token_id: "demo-yes".to_string(),
            start: None,
            ticks: 120,
            tick_interval_secs: 3600,
            strategy: StrategyConfig::default(),
            parameters: Parameters::new(),
            feed: FeedConfig::default(),
        }
    }
}

/// Final state of one broker's book
#[derive(Debug, Clone, Serialize)]
pub struct BookReport {
    pub positions: Vec<Position>,
    pub open_orders: Vec<Order>,
    pub balance: Balance,
    pub metrics: PerformanceMetrics,
    pub daily: Vec<DailyMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub ticks: usize,
    pub orders_placed: usize,
    pub resting_fills: usize,
    pub rejections: Vec<String>,
    pub paper: BookReport,
    pub shadow: BookReport,
    pub comparison: ShadowComparison,
}

pub struct TradingSession {
    config: SessionConfig,
    market: StaticMarketData,
    clock: ManualClock,
    feed: QuoteFeed,
    paper: PaperBroker,
    shadow: ShadowBroker,
    analytics: AnalyticsService,
}

impl TradingSession {
    pub fn new(meridian: MeridianConfig, config: SessionConfig) -> Self {
        let market = StaticMarketData::new();
        let clock = ManualClock::at(config.start.unwrap_or_else(|| SystemClock::new().now()));
        let feed = QuoteFeed::new(config.token_id.clone(), config.feed.clone());

        // The first tick publishes the opening quote
        let factory = BrokerFactory::from_config(
            meridian.clone(),
            Arc::new(market.clone()),
            Arc::new(LogAuditSink),
            Arc::new(clock.clone()),
        );
        let analytics =
            AnalyticsService::new(factory.context().ledger.clone(), meridian.analytics.clone());

        Self {
            paper: factory.paper(&config.user_id),
            shadow: factory.shadow(&config.user_id),
            config,
            market,
            clock,
            feed,
            analytics,
        }
    }

    pub async fn run(mut self) -> Result<SessionReport> {
        let mut paper_strategy = self.config.strategy.build();
        let mut shadow_strategy = self.config.strategy.build();
        paper_strategy.initialize(&self.config.parameters)?;
        shadow_strategy.initialize(&self.config.parameters)?;
        info!(
            "[SESSION] Starting {} ticks of {} for {} on {}",
            self.config.ticks,
            paper_strategy.name(),
            self.config.user_id,
            self.config.token_id
        );
        let mut orders_placed = 0;
        let mut resting_fills = 0;
        let mut rejections = Vec::new();

        for tick in 0..self.config.ticks {
            self.clock
                .advance(Duration::seconds(self.config.tick_interval_secs));
            let quote = self.feed.tick(&self.market);
            resting_fills += self.paper.process_resting_orders().await?.len();

            let market =
                MarketState::from_quote(&self.config.market_id, &self.config.token_id, &quote, false);
            let market_data = BTreeMap::from([(market.market_id.clone(), market.clone())]);

            let books: [(&dyn Broker, &mut Box<dyn Strategy>); 2] = [
                (&self.paper, &mut paper_strategy),
                (&self.shadow, &mut shadow_strategy),
            ];
            for (broker, strategy) in books {
                strategy.on_tick(&market);
                let ctx = self.context(broker, &market_data).await?;

                for intent in strategy.propose_orders(&ctx) {
                    if !strategy.risk_check(&intent, &ctx) {
                        rejections.push(format!(
                            "{} tick {}: {} vetoed {} {}",
                            broker.mode(),
                            tick,
                            strategy.name(),
                            intent.side,
                            intent.size
                        ));
                        continue;
                    }
                    match broker.place_order(&intent).await? {
                        OrderResult::Success { .. } => orders_placed += 1,
                        OrderResult::Failure { reason, .. } => {
                            warn!("[SESSION] {} tick {}: {}", broker.mode(), tick, reason);
                            rejections.push(format!("{} tick {}: {}", broker.mode(), tick, reason));
                        }
                    }
                }
            }
        }

        let paper = self.book_report(&self.paper).await?;
        let shadow = self.book_report(&self.shadow).await?;
        let comparison = self.shadow.compare_with_paper();
        info!(
            "[SESSION] Done: {} orders, shadow - paper PnL = {}",
            orders_placed, comparison.difference
        );

        Ok(SessionReport {
            ticks: self.config.ticks,
            orders_placed,
            resting_fills,
            rejections,
            paper,
            shadow,
            comparison,
        })
    }

    /// Snapshot of one broker's book for its strategy
    async fn context(
        &self,
        broker: &dyn Broker,
        market_data: &BTreeMap<String, MarketState>,
    ) -> Result<StrategyContext> {
        Ok(StrategyContext {
            mode: broker.mode(),
            positions: broker.get_positions(PositionFilter::Open).await?,
            open_orders: broker.get_open_orders().await?,
            balance: broker.get_balance().await?,
            market_data: market_data.clone(),
            parameters: self.config.parameters.clone(),
        })
    }

    async fn book_report(&self, broker: &dyn Broker) -> Result<BookReport> {
        let mode = broker.mode();
        let elapsed = self.config.ticks as i64 * self.config.tick_interval_secs;
        let days = u32::try_from(elapsed / 86_400 + 1).unwrap_or(u32::MAX);

        Ok(BookReport {
            positions: broker.get_positions(PositionFilter::All).await?,
            open_orders: broker.get_open_orders().await?,
            balance: broker.get_balance().await?,
            metrics: self
                .analytics
                .calculate_metrics(&self.config.user_id, mode, None),
            daily: self
                .analytics
                .daily_metrics(&self.config.user_id, mode, days)?,
        })
    }
}
