//! Metric report types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AnalyticsError, Result};

/// Inclusive time window a report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(AnalyticsError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }

    pub fn num_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

/// Gross wins over gross losses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfitFactor {
    Finite(Decimal),
    /// Wins with no losses
    Infinite,
}

impl ProfitFactor {
    pub fn from_totals(gross_wins: Decimal, gross_losses: Decimal) -> Self {
        let losses = gross_losses.abs();
        if losses > Decimal::ZERO {
            ProfitFactor::Finite(gross_wins / losses)
        } else if gross_wins > Decimal::ZERO {
            ProfitFactor::Infinite
        } else {
            ProfitFactor::Finite(Decimal::ZERO)
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, ProfitFactor::Infinite)
    }
}

impl Default for ProfitFactor {
    fn default() -> Self {
        ProfitFactor::Finite(Decimal::ZERO)
    }
}

impl fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfitFactor::Finite(value) => write!(f, "{}", value.round_dp(4)),
            ProfitFactor::Infinite => write!(f, "inf"),
        }
    }
}

/// Performance of one (user, mode) book over a date range
///
/// A trade is a closed position; its result is the position's realized PnL.
/// Loss figures (`average_loss`, `largest_loss`) keep their negative sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub range: DateRange,

    // Trades
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percent of trades with positive PnL
    pub win_rate: Decimal,
    pub profit_factor: ProfitFactor,
    pub average_win: Decimal,
    pub average_loss: Decimal,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,

    // PnL
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub total_fees: Decimal,
    /// realized + unrealized - fees
    pub net_pnl: Decimal,

    // Activity
    pub filled_orders: usize,
    pub total_volume: Decimal,

    // Risk
    pub max_drawdown: Decimal,
    pub max_drawdown_percent: Decimal,
    /// Fraction of the range with at least one open position, in [0, 1]
    pub exposure_time: Decimal,
    /// Annualized; `None` with fewer than two observations or zero volatility
    pub sharpe_ratio: Option<Decimal>,
}

impl PerformanceMetrics {
    /// Report with nothing traded
    pub fn empty(range: DateRange) -> Self {
        Self {
            range,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: Decimal::ZERO,
            profit_factor: ProfitFactor::default(),
            average_win: Decimal::ZERO,
            average_loss: Decimal::ZERO,
            largest_win: Decimal::ZERO,
            largest_loss: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            total_fees: Decimal::ZERO,
            net_pnl: Decimal::ZERO,
            filled_orders: 0,
            total_volume: Decimal::ZERO,
            max_drawdown: Decimal::ZERO,
            max_drawdown_percent: Decimal::ZERO,
            exposure_time: Decimal::ZERO,
            sharpe_ratio: None,
        }
    }
}

/// Cash-flow activity of one UTC day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    /// SELL value - fees minus BUY value + fees
    pub pnl: Decimal,
    pub trades: usize,
    pub volume: Decimal,
    pub fees: Decimal,
}

impl DailyMetrics {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            pnl: Decimal::ZERO,
            trades: 0,
            volume: Decimal::ZERO,
            fees: Decimal::ZERO,
        }
    }
}
