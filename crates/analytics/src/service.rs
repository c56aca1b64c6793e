//! Analytics over a live ledger

use chrono::Days;
use log::debug;
use meridian_core::ExecutionMode;
use meridian_ledger::{Ledger, PositionFilter};

use crate::config::AnalyticsConfig;
use crate::engine::AnalyticsEngine;
use crate::error::{AnalyticsError, Result};
use crate::metrics::{DailyMetrics, DateRange, PerformanceMetrics};

/// Longest window `daily_metrics` will build, about ten years
pub const MAX_DAILY_WINDOW: u32 = 3660;

/// Reads ledger snapshots and hands them to the [`AnalyticsEngine`]
#[derive(Clone)]
pub struct AnalyticsService {
    ledger: Ledger,
    engine: AnalyticsEngine,
}

impl AnalyticsService {
    pub fn new(ledger: Ledger, config: AnalyticsConfig) -> Self {
        Self {
            ledger,
            engine: AnalyticsEngine::new(config),
        }
    }

    pub fn engine(&self) -> &AnalyticsEngine {
        &self.engine
    }

    /// Metrics for a book; without a range, from its first order until now
    pub fn calculate_metrics(
        &self,
        user_id: &str,
        mode: ExecutionMode,
        range: Option<DateRange>,
    ) -> PerformanceMetrics {
        let orders = self.ledger.filled_orders(user_id, mode);
        let positions = self.ledger.list_positions(user_id, mode, PositionFilter::All);

        let range = range.unwrap_or_else(|| {
            let now = self.ledger.now();
            let first = self
                .ledger
                .list_orders(user_id, mode)
                .iter()
                .map(|o| o.created_at)
                .min()
                .unwrap_or(now)
                .min(now);
            DateRange { start: first, end: now }
        });

        let metrics = self.engine.calculate(&orders, &positions, range);
        debug!(
            "[ANALYTICS] {} {}: {} trades, net {}, max drawdown {}",
            user_id, mode, metrics.total_trades, metrics.net_pnl, metrics.max_drawdown
        );
        metrics
    }

    /// One entry per UTC day for the last `days` days, today included
    ///
    /// `days` must be between 1 and [`MAX_DAILY_WINDOW`].
    pub fn daily_metrics(
        &self,
        user_id: &str,
        mode: ExecutionMode,
        days: u32,
    ) -> Result<Vec<DailyMetrics>> {
        if days == 0 {
            return Err(AnalyticsError::EmptyWindow);
        }
        let too_large = AnalyticsError::WindowTooLarge {
            days,
            max: MAX_DAILY_WINDOW,
        };
        if days > MAX_DAILY_WINDOW {
            return Err(too_large);
        }
        let last = self.ledger.now().date_naive();
        let first = last
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .ok_or(too_large)?;

        let orders = self.ledger.filled_orders(user_id, mode);
        Ok(self.engine.daily_breakdown(&orders, first, last))
    }
}
