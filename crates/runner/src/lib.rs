//! Meridian Runner - paper/shadow trading session
//!
//! Wires the execution/risk core end to end without a venue:
//!
//! ```text
//!   QuoteFeed ──quotes──► StaticMarketData
//!                               │
//!          ┌────────────────────┼────────────────────┐
//!          ▼                                         ▼
//!   ┌──────────────┐                         ┌──────────────┐
//!   │ PaperBroker  │    Strategy per book    │ ShadowBroker │
//!   └──────┬───────┘                         └──────┬───────┘
//!          │        RiskGate / ExecutionSimulator   │
//!          └──────────────────┬─────────────────────┘
//!                             ▼
//!                          Ledger ──► AnalyticsService ──► SessionReport
//! ```

pub mod feed;
pub mod market_maker;
pub mod mean_reversion;
pub mod session;
pub mod strategy;

pub use feed::{FeedConfig, QuoteFeed};
pub use market_maker::{MarketMaker, MarketMakerConfig};
pub use mean_reversion::{MeanReversion, MeanReversionConfig};
pub use session::{BookReport, SessionConfig, SessionError, SessionReport, TradingSession};
pub use strategy::{Parameters, Strategy, StrategyConfig, StrategyContext, StrategyError};
