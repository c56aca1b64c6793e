//! Stateless metric calculator
//!
//! Inputs are ledger snapshots: the filled orders and the positions of one
//! (user, mode) book. Nothing here reads a clock or a store, so every
//! figure is reproducible from the same snapshot.

use chrono::NaiveDate;
use meridian_core::{Order, Position};
use meridian_execution::sqrt_decimal;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::config::AnalyticsConfig;
use crate::metrics::{DailyMetrics, DateRange, PerformanceMetrics, ProfitFactor};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Full report for orders filled and positions held within `range`
    pub fn calculate(
        &self,
        orders: &[Order],
        positions: &[Position],
        range: DateRange,
    ) -> PerformanceMetrics {
        let fills = fills_in_range(orders, &range);
        let held: Vec<&Position> = positions
            .iter()
            .filter(|p| {
                p.opened_at <= range.end && p.closed_at.is_none_or(|closed| closed >= range.start)
            })
            .collect();

        let mut metrics = PerformanceMetrics::empty(range);
        self.trade_stats(&held, &range, &mut metrics);

        metrics.realized_pnl = held.iter().map(|p| p.realized_pnl).sum();
        metrics.unrealized_pnl = held.iter().map(|p| p.unrealized_pnl()).sum();
        metrics.total_fees = fills.iter().map(|o| o.fees).sum();
        metrics.net_pnl = metrics.realized_pnl + metrics.unrealized_pnl - metrics.total_fees;

        metrics.filled_orders = fills.len();
        metrics.total_volume = fills.iter().map(|o| o.filled_value()).sum();

        let (max_drawdown, max_drawdown_percent) = self.drawdown(&fills);
        metrics.max_drawdown = max_drawdown;
        metrics.max_drawdown_percent = max_drawdown_percent;
        metrics.exposure_time = exposure_time(&held, &range);

        let daily = bucket_by_day(
            fills.iter().copied(),
            range.start.date_naive(),
            range.end.date_naive(),
        );
        metrics.sharpe_ratio = self.sharpe_ratio(&daily);

        metrics
    }

    /// Per-day cash flow from `first` to `last` inclusive, zero-filled
    pub fn daily_breakdown(
        &self,
        orders: &[Order],
        first: NaiveDate,
        last: NaiveDate,
    ) -> Vec<DailyMetrics> {
        bucket_by_day(orders, first, last)
    }

    fn trade_stats(&self, held: &[&Position], range: &DateRange, metrics: &mut PerformanceMetrics) {
        let trades: Vec<Decimal> = held
            .iter()
            .filter(|p| p.closed_at.is_some_and(|closed| range.contains(closed)))
            .map(|p| p.realized_pnl)
            .collect();
        if trades.is_empty() {
            return;
        }

        let wins: Vec<Decimal> = trades.iter().copied().filter(|pnl| *pnl > Decimal::ZERO).collect();
        let losses: Vec<Decimal> = trades.iter().copied().filter(|pnl| *pnl < Decimal::ZERO).collect();
        let gross_wins: Decimal = wins.iter().sum();
        let gross_losses: Decimal = losses.iter().sum();

        metrics.total_trades = trades.len();
        metrics.winning_trades = wins.len();
        metrics.losing_trades = losses.len();
        metrics.win_rate = Decimal::from(wins.len()) / Decimal::from(trades.len()) * HUNDRED;
        metrics.profit_factor = ProfitFactor::from_totals(gross_wins, gross_losses);

        if !wins.is_empty() {
            metrics.average_win = gross_wins / Decimal::from(wins.len());
            metrics.largest_win = wins.iter().copied().max().unwrap_or_default();
        }
        if !losses.is_empty() {
            metrics.average_loss = gross_losses / Decimal::from(losses.len());
            metrics.largest_loss = losses.iter().copied().min().unwrap_or_default();
        }
    }

    /// Largest peak-to-trough fall of the replayed cash balance
    ///
    /// Returns the absolute drawdown and its percentage of the peak it fell
    /// from.
    fn drawdown(&self, fills: &[&Order]) -> (Decimal, Decimal) {
        let mut balance = self.config.starting_balance;
        let mut peak = balance;
        let mut max_drawdown = Decimal::ZERO;
        let mut max_drawdown_percent = Decimal::ZERO;

        for order in fills {
            balance += order.cash_flow();
            peak = peak.max(balance);

            let drawdown = peak - balance;
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
                if peak > Decimal::ZERO {
                    max_drawdown_percent = drawdown / peak * HUNDRED;
                }
            }
        }
        (max_drawdown, max_drawdown_percent)
    }

    /// Annualized Sharpe over daily returns
    ///
    /// Each day's return is its cash flow over the replayed balance at the
    /// start of that day. Uses the sample standard deviation.
    fn sharpe_ratio(&self, daily: &[DailyMetrics]) -> Option<Decimal> {
        let mut balance = self.config.starting_balance;
        let mut returns = Vec::with_capacity(daily.len());
        for day in daily {
            if balance > Decimal::ZERO {
                returns.push(day.pnl / balance);
            }
            balance += day.pnl;
        }
        if returns.len() < 2 {
            return None;
        }

        let n = Decimal::from(returns.len());
        let mean = returns.iter().sum::<Decimal>() / n;
        let variance = returns
            .iter()
            .map(|r| (*r - mean) * (*r - mean))
            .sum::<Decimal>()
            / (n - Decimal::ONE);
        let std_dev = sqrt_decimal(variance);
        if std_dev.is_zero() {
            return None;
        }

        let periods = Decimal::from(self.config.periods_per_year);
        let annual_mean = mean * periods;
        let annual_std = std_dev * sqrt_decimal(periods);
        Some((annual_mean - self.config.risk_free_rate) / annual_std)
    }
}

/// Filled orders whose fill time falls in the range, oldest first
fn fills_in_range<'a>(orders: &'a [Order], range: &DateRange) -> Vec<&'a Order> {
    let mut fills: Vec<&Order> = orders
        .iter()
        .filter(|o| o.filled_size > Decimal::ZERO)
        .filter(|o| o.filled_at.is_some_and(|at| range.contains(at)))
        .collect();
    fills.sort_by_key(|o| o.filled_at);
    fills
}

/// Group fills into zero-filled UTC days from `first` to `last`
fn bucket_by_day<'a>(
    orders: impl IntoIterator<Item = &'a Order>,
    first: NaiveDate,
    last: NaiveDate,
) -> Vec<DailyMetrics> {
    let mut days: BTreeMap<NaiveDate, DailyMetrics> = first
        .iter_days()
        .take_while(|day| *day <= last)
        .map(|day| (day, DailyMetrics::empty(day)))
        .collect();

    for order in orders.into_iter().filter(|o| o.filled_size > Decimal::ZERO) {
        let Some(filled_at) = order.filled_at else {
            continue;
        };
        if let Some(day) = days.get_mut(&filled_at.date_naive()) {
            day.pnl += order.cash_flow();
            day.trades += 1;
            day.volume += order.filled_value();
            day.fees += order.fees;
        }
    }

    days.into_values().collect()
}

/// Summed open time of each position, clipped to the range, over its length
fn exposure_time(held: &[&Position], range: &DateRange) -> Decimal {
    let length = (range.end - range.start).num_milliseconds();
    if length <= 0 {
        return Decimal::ZERO;
    }

    let open_ms: i64 = held
        .iter()
        .map(|p| {
            let from = p.opened_at.max(range.start);
            let to = p.closed_at.unwrap_or(range.end).min(range.end);
            (to - from).num_milliseconds().max(0)
        })
        .sum();

    (Decimal::from(open_ms) / Decimal::from(length)).min(Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use meridian_core::{ExecutionMode, OrderIntent, OrderStatus, PositionKey, Side};
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap()
    }

    fn filled(side: Side, size: Decimal, price: Decimal, fees: Decimal, at: DateTime<Utc>) -> Order {
        let intent = OrderIntent::market("m1", "yes", side, size);
        let mut order = Order::from_intent("u1", &intent, ExecutionMode::Paper, OrderStatus::Filled, at);
        order.filled_size = size;
        order.filled_price = Some(price);
        order.fees = fees;
        order.filled_at = Some(at);
        order
    }

    fn closed(pnl: Decimal, opened: DateTime<Utc>, closed: DateTime<Utc>) -> Position {
        let key = PositionKey::new("u1", "m1", "yes", ExecutionMode::Paper);
        let mut position = Position::open(&key, dec!(10), dec!(0.5), opened);
        position.size = Decimal::ZERO;
        position.realized_pnl = pnl;
        position.closed_at = Some(closed);
        position
    }

    fn day_range() -> DateRange {
        DateRange::new(t0(), t0() + Duration::hours(10)).unwrap()
    }

    #[test]
    fn test_trade_statistics() {
        let engine = AnalyticsEngine::default();
        let positions = vec![
            closed(dec!(3), t0(), t0() + Duration::hours(1)),
            closed(dec!(1), t0(), t0() + Duration::hours(2)),
            closed(dec!(-2), t0(), t0() + Duration::hours(3)),
        ];

        let metrics = engine.calculate(&[], &positions, day_range());
        assert_eq!(metrics.total_trades, 3);
        assert_eq!(metrics.winning_trades, 2);
        assert_eq!(metrics.losing_trades, 1);
        assert_eq!(metrics.win_rate.round_dp(2), dec!(66.67));
        assert_eq!(metrics.profit_factor, ProfitFactor::Finite(dec!(2)));
        assert_eq!(metrics.average_win, dec!(2));
        assert_eq!(metrics.average_loss, dec!(-2));
        assert_eq!(metrics.largest_win, dec!(3));
        assert_eq!(metrics.largest_loss, dec!(-2));
        assert_eq!(metrics.realized_pnl, dec!(2));
    }

    #[test]
    fn test_no_trades_is_zeroed() {
        let metrics = AnalyticsEngine::default().calculate(&[], &[], day_range());
        assert_eq!(metrics.win_rate, Decimal::ZERO);
        assert_eq!(metrics.profit_factor, ProfitFactor::Finite(Decimal::ZERO));
        assert_eq!(metrics.sharpe_ratio, None);
        assert_eq!(metrics.exposure_time, Decimal::ZERO);
    }

    #[test]
    fn test_only_winners_have_infinite_profit_factor() {
        let positions = vec![closed(dec!(5), t0(), t0() + Duration::hours(1))];
        let metrics = AnalyticsEngine::default().calculate(&[], &positions, day_range());
        assert!(metrics.profit_factor.is_infinite());
        assert_eq!(metrics.win_rate, dec!(100));
    }

    #[test]
    fn test_drawdown_from_replayed_balance() {
        let engine = AnalyticsEngine::new(AnalyticsConfig {
            starting_balance: dec!(100),
            ..Default::default()
        });
        let orders = vec![
            // 100 -> 120 -> 90 -> 110
            filled(Side::Sell, dec!(40), dec!(0.5), Decimal::ZERO, t0() + Duration::minutes(1)),
            filled(Side::Buy, dec!(60), dec!(0.5), Decimal::ZERO, t0() + Duration::minutes(2)),
            filled(Side::Sell, dec!(40), dec!(0.5), Decimal::ZERO, t0() + Duration::minutes(3)),
        ];

        let metrics = engine.calculate(&orders, &[], day_range());
        assert_eq!(metrics.max_drawdown, dec!(30));
        assert_eq!(metrics.max_drawdown_percent, dec!(25));
        assert_eq!(metrics.filled_orders, 3);
        assert_eq!(metrics.total_volume, dec!(70));
    }

    #[test]
    fn test_orders_outside_range_are_ignored() {
        let engine = AnalyticsEngine::default();
        let orders = vec![
            filled(Side::Buy, dec!(10), dec!(0.5), dec!(0.03), t0() - Duration::hours(1)),
            filled(Side::Buy, dec!(10), dec!(0.5), dec!(0.03), t0() + Duration::hours(1)),
        ];
        let metrics = engine.calculate(&orders, &[], day_range());
        assert_eq!(metrics.filled_orders, 1);
        assert_eq!(metrics.total_fees, dec!(0.03));
    }

    #[test]
    fn test_exposure_time_clipped_to_range() {
        let range = day_range();
        let key = PositionKey::new("u1", "m1", "yes", ExecutionMode::Paper);
        // Open before the range, still open: covers the whole range
        let open = Position::open(&key, dec!(1), dec!(0.5), t0() - Duration::hours(5));
        let metrics = AnalyticsEngine::default().calculate(&[], &[open], range);
        assert_eq!(metrics.exposure_time, Decimal::ONE);

        // Open for 2.5 of 10 hours
        let position = closed(dec!(1), t0() + Duration::hours(1), t0() + Duration::minutes(210));
        let metrics = AnalyticsEngine::default().calculate(&[], &[position], range);
        assert_eq!(metrics.exposure_time, dec!(0.25));
    }

    #[test]
    fn test_daily_breakdown_zero_fills_gaps() {
        let engine = AnalyticsEngine::default();
        let day1 = t0();
        let day3 = t0() + Duration::days(2);
        let orders = vec![
            filled(Side::Buy, dec!(10), dec!(0.5), dec!(0.03), day1),
            filled(Side::Sell, dec!(10), dec!(0.6), dec!(0.036), day3),
        ];

        let days = engine.daily_breakdown(&orders, day1.date_naive(), day3.date_naive());
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].pnl, dec!(-5.03));
        assert_eq!(days[0].trades, 1);
        assert_eq!(days[1], DailyMetrics::empty(days[1].date));
        assert_eq!(days[2].pnl, dec!(5.964));
        assert_eq!(days[2].volume, dec!(6.0));
        assert_eq!(days[2].fees, dec!(0.036));
    }

    #[test]
    fn test_sharpe_ignores_fills_outside_range_on_boundary_days() {
        let engine = AnalyticsEngine::default();
        // Day one from noon, day two until 18:00
        let range = DateRange::new(t0(), t0() + Duration::hours(30)).unwrap();
        let inside = vec![
            filled(Side::Sell, dec!(20), dec!(0.5), Decimal::ZERO, t0() + Duration::hours(1)),
            filled(Side::Buy, dec!(10), dec!(0.5), Decimal::ZERO, t0() + Duration::hours(25)),
        ];
        let mut all = inside.clone();
        all.push(filled(Side::Buy, dec!(1000), dec!(0.5), Decimal::ZERO, t0() - Duration::hours(6)));
        all.push(filled(Side::Sell, dec!(900), dec!(0.5), Decimal::ZERO, t0() + Duration::hours(32)));

        let expected = engine.calculate(&inside, &[], range).sharpe_ratio;
        assert!(expected.is_some());
        assert_eq!(engine.calculate(&all, &[], range).sharpe_ratio, expected);
    }

    #[test]
    fn test_sharpe_needs_two_observations() {
        let engine = AnalyticsEngine::default();
        let single = vec![DailyMetrics {
            pnl: dec!(10),
            ..DailyMetrics::empty(t0().date_naive())
        }];
        assert_eq!(engine.sharpe_ratio(&single), None);

        // Flat returns have no volatility
        let flat: Vec<DailyMetrics> = (0..3)
            .map(|i| DailyMetrics::empty(t0().date_naive() + Duration::days(i)))
            .collect();
        assert_eq!(engine.sharpe_ratio(&flat), None);
    }

    #[test]
    fn test_sharpe_annualized() {
        let engine = AnalyticsEngine::new(AnalyticsConfig {
            starting_balance: dec!(100),
            ..Default::default()
        });
        // Returns +1% then -1%/1.01... balances 100 -> 101 -> 100
        let days: Vec<DailyMetrics> = [dec!(1), dec!(-1)]
            .into_iter()
            .enumerate()
            .map(|(i, pnl)| DailyMetrics {
                pnl,
                ..DailyMetrics::empty(t0().date_naive() + Duration::days(i as i64))
            })
            .collect();

        let sharpe = engine.sharpe_ratio(&days).unwrap();
        // mean = (0.01 - 0.0099009901) / 2, small and positive
        assert!(sharpe > Decimal::ZERO);
        assert!(sharpe < dec!(0.2));
    }
}
