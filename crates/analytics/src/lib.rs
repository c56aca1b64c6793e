//! Meridian Analytics
//!
//! Performance metrics derived purely from ledger state.
//!
//! ```text
//!   Ledger ──filled orders──┬─► trades (closed positions) ─► win rate, profit factor
//!          ──positions──────┤
//!                           ├─► cash replay from starting balance ─► drawdown
//!                           ├─► open intervals ─► exposure time
//!                           └─► daily buckets (UTC) ─► daily metrics, Sharpe
//! ```
//!
//! [`AnalyticsEngine`] is stateless and works on snapshots; [`AnalyticsService`]
//! reads the snapshots from a [`meridian_ledger::Ledger`].

mod config;
mod engine;
mod error;
mod metrics;
mod service;

pub use config::AnalyticsConfig;
pub use engine::AnalyticsEngine;
pub use error::{AnalyticsError, Result};
pub use metrics::{DailyMetrics, DateRange, PerformanceMetrics, ProfitFactor};
pub use service::{AnalyticsService, MAX_DAILY_WINDOW};
