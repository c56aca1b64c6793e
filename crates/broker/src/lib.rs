//! Meridian Broker
//!
//! One `Broker` trait over three execution semantics:
//! - **Paper**: simulated fills against live quotes, virtual cash
//! - **Live**: venue fills through the order gateway, two-phase records
//! - **Shadow**: priced like paper, never executed, exempt from the kill switch
//!
//! ## Architecture
//!
//! ```text
//!                 BrokerFactory::create(user, mode)
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!     PaperBroker          LiveBroker          ShadowBroker
//!          │                   │                   │
//!          └─────────┬─────────┴─────────┬─────────┘
//!                    │   BrokerContext   │
//!        ┌───────────┼──────────┬────────┴────────┐
//!      Ledger    RiskGate  ExecutionSimulator   Ports
//!                                        (market data, audit,
//!                                         gateway, credentials)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let config = load_default_config()?;
//! let factory = BrokerFactory::from_config(config, market_data, audit, clock);
//! let broker = factory.create("user-1", ExecutionMode::Paper).await?;
//! let result = broker.place_order(&OrderIntent::market("m", "yes", Side::Buy, dec!(10))).await?;
//! ```

pub mod adapters;
pub mod config;
mod broker;
mod context;
mod error;
mod factory;
mod live;
mod paper;
mod result;
mod shadow;

pub use broker::Broker;
pub use config::{ConfigError, MeridianConfig, load_config, load_config_from_str, load_default_config};
pub use context::{BrokerContext, actions};
pub use error::{BrokerError, Result};
pub use factory::BrokerFactory;
pub use live::LiveBroker;
pub use paper::PaperBroker;
pub use result::{CancelAllResult, CancelFailure, CancelResult, OrderResult, ShadowComparison};
pub use shadow::ShadowBroker;
