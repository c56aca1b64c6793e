//! Simulated Fill Scenarios
//!
//! Drives the simulator with the canonical fallback-shaped quote
//! {bid 0.45, ask 0.55, volume 1}.

use chrono::Utc;
use meridian_core::{ExecutionMode, Liquidity, Order, OrderIntent, OrderStatus, Quote, Side};
use meridian_execution::{
    ExecutionConfig, ExecutionSimulator, FeeSchedule, RealisticSlippage, SimulatedExecution,
    SlippageConfig,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn quote() -> Quote {
    Quote::new(dec!(0.45), dec!(0.55), dec!(1))
}

fn assert_close(actual: Decimal, expected: Decimal, tolerance: Decimal) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} ~ {}, tolerance {}",
        actual,
        expected,
        tolerance
    );
}

/// MARKET BUY 10 with realistic slippage, impact 0.05:
/// 0.55 + 0.55 × min(√(10/100) × 0.05, 0.10) ≈ 0.5587, fee ≈ 0.0335
#[test]
fn test_market_buy_realistic_round_trip() {
    let sim = ExecutionSimulator::with_model(
        Box::new(RealisticSlippage::with_impact(dec!(0.05))),
        FeeSchedule::default(),
    );
    let intent = OrderIntent::market("market-1", "token-yes", Side::Buy, dec!(10));

    let SimulatedExecution::Filled(fill) = sim.simulate(&intent, &quote()) else {
        panic!("market buy must fill");
    };

    assert_eq!(fill.size, dec!(10));
    assert_close(fill.price, dec!(0.5587), dec!(0.0001));
    assert_close(fill.fees, dec!(0.0335), dec!(0.0001));
    assert_close(fill.slippage, dec!(0.0087), dec!(0.0001));
    assert_eq!(fill.liquidity, Liquidity::Taker);
}

/// Same scenario configured through JSON
#[test]
fn test_round_trip_from_config() {
    let config = ExecutionConfig {
        slippage: SlippageConfig::Realistic {
            impact_factor: dec!(0.05),
            max_impact: dec!(0.10),
        },
        ..Default::default()
    };
    let sim = ExecutionSimulator::new(&config);
    assert_eq!(sim.slippage_model(), "realistic");

    let intent = OrderIntent::market("market-1", "token-yes", Side::Buy, dec!(10));
    let SimulatedExecution::Filled(fill) = sim.simulate(&intent, &quote()) else {
        panic!("market buy must fill");
    };
    assert_close(fill.price, dec!(0.5587), dec!(0.0001));
}

/// LIMIT BUY at 0.50 below the 0.55 ask rests without a fill
#[test]
fn test_limit_buy_below_ask_rests() {
    let sim = ExecutionSimulator::new(&ExecutionConfig::default());
    let intent = OrderIntent::limit("market-1", "token-yes", Side::Buy, dec!(10), dec!(0.50));

    assert_eq!(sim.simulate(&intent, &quote()), SimulatedExecution::Resting);
}

/// A resting order fills at its limit with the maker fee once crossed
#[test]
fn test_resting_order_fills_as_maker() {
    let sim = ExecutionSimulator::new(&ExecutionConfig::default());
    let intent = OrderIntent::limit("market-1", "token-yes", Side::Buy, dec!(10), dec!(0.50));
    let order = Order::from_intent("user-1", &intent, ExecutionMode::Paper, OrderStatus::Open, Utc::now());

    assert!(sim.fill_resting(&order, &quote()).is_none());

    let moved = Quote::new(dec!(0.44), dec!(0.49), dec!(5));
    let fill = sim.fill_resting(&order, &moved).expect("crossed order should fill");
    assert_eq!(fill.price, dec!(0.50));
    assert_eq!(fill.size, dec!(10));
    assert_eq!(fill.fees, Decimal::ZERO);
    assert_eq!(fill.liquidity, Liquidity::Maker);

    let mut cancelled = order.clone();
    cancelled.status = OrderStatus::Cancelled;
    assert!(sim.fill_resting(&cancelled, &moved).is_none());
}

/// Bigger orders pay more impact, but never beyond the cap
#[test]
fn test_impact_grows_with_size_until_cap() {
    let sim = ExecutionSimulator::with_model(
        Box::new(RealisticSlippage::with_impact(dec!(0.05))),
        FeeSchedule::default(),
    );
    let price_for = |size: Decimal| {
        let intent = OrderIntent::market("market-1", "token-yes", Side::Buy, size);
        match sim.simulate(&intent, &quote()) {
            SimulatedExecution::Filled(fill) => fill.price,
            SimulatedExecution::Resting => panic!("market buy must fill"),
        }
    };

    let small = price_for(dec!(1));
    let medium = price_for(dec!(25));
    let huge = price_for(dec!(100000));
    assert!(small < medium);
    assert!(medium < huge);
    assert_eq!(huge, dec!(0.605)); // 0.55 × 1.10
}
