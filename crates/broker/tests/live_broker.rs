//! Live Broker Integration Tests
//!
//! Two-phase submission against a scripted venue gateway.

use async_trait::async_trait;
use meridian_broker::adapters::{MemoryAuditSink, StaticCredentialStore, StaticMarketData};
use meridian_broker::{
    Broker, BrokerError, BrokerFactory, CancelResult, LiveBroker, MeridianConfig, OrderResult,
    actions,
};
use meridian_clock::ManualClock;
use meridian_ledger::PositionFilter;
use meridian_risk_manager::RateLimiter;
use meridian_core::{ExecutionMode, Liquidity, Order, OrderIntent, OrderStatus, Quote, RiskLimits, Side};
use meridian_ports::{
    ApiCredentials, CredentialError, CredentialStore, GatewayConnector, GatewayError, GatewayFill,
    GatewayOrder, OrderGateway, SubmitOutcome,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

const USER: &str = "trader-7";
const MARKET: &str = "fed-cut-june";
const TOKEN: &str = "token-no";

/// Venue double that replays scripted submit outcomes
#[derive(Default)]
struct ScriptedGateway {
    outcomes: Mutex<VecDeque<Result<SubmitOutcome, GatewayError>>>,
    submitted: Mutex<Vec<GatewayOrder>>,
    cancelled: Mutex<Vec<String>>,
    cancel_error: Mutex<Option<GatewayError>>,
    delay: Mutex<Option<Duration>>,
    collateral: Mutex<Option<Decimal>>,
}

impl ScriptedGateway {
    fn push(&self, outcome: Result<SubmitOutcome, GatewayError>) {
        self.outcomes.lock().push_back(outcome);
    }

    fn accept(&self, external_id: &str, status: OrderStatus, fill: Option<GatewayFill>) {
        self.push(Ok(SubmitOutcome::Accepted {
            external_id: external_id.to_string(),
            status,
            fill,
        }));
    }
}

#[async_trait]
impl OrderGateway for ScriptedGateway {
    async fn submit(&self, order: &GatewayOrder) -> Result<SubmitOutcome, GatewayError> {
        self.submitted.lock().push(order.clone());
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Submission("no scripted outcome".to_string())))
    }

    async fn cancel(&self, external_id: &str) -> Result<(), GatewayError> {
        if let Some(e) = self.cancel_error.lock().clone() {
            return Err(e);
        }
        self.cancelled.lock().push(external_id.to_string());
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), GatewayError> {
        self.cancelled.lock().push("*".to_string());
        Ok(())
    }

    async fn collateral_balance(&self) -> Result<Option<Decimal>, GatewayError> {
        Ok(*self.collateral.lock())
    }
}

struct FixedConnector {
    gateway: Arc<ScriptedGateway>,
}

#[async_trait]
impl GatewayConnector for FixedConnector {
    async fn connect(
        &self,
        credentials: &ApiCredentials,
    ) -> Result<Arc<dyn OrderGateway>, GatewayError> {
        if credentials.api_key.is_empty() {
            return Err(GatewayError::Connection("empty api key".to_string()));
        }
        Ok(self.gateway.clone())
    }
}

struct UndecryptableStore;

#[async_trait]
impl CredentialStore for UndecryptableStore {
    async fn credentials(&self, _user_id: &str) -> Result<ApiCredentials, CredentialError> {
        Err(CredentialError::Decryption("key derivation failed".to_string()))
    }
}

struct Harness {
    broker: LiveBroker,
    gateway: Arc<ScriptedGateway>,
    audit: MemoryAuditSink,
    factory: BrokerFactory,
}

fn credentials() -> ApiCredentials {
    ApiCredentials {
        api_key: "key".to_string(),
        api_secret: "secret".to_string(),
        passphrase: "phrase".to_string(),
    }
}

fn factory(risk: RiskLimits) -> (BrokerFactory, Arc<ScriptedGateway>, MemoryAuditSink) {
    let _ = env_logger::builder().is_test(true).try_init();

    let config = MeridianConfig {
        risk,
        ..Default::default()
    };
    let market = StaticMarketData::new().with_quote(TOKEN, Quote::new(dec!(0.45), dec!(0.55), dec!(1)));
    let audit = MemoryAuditSink::new();
    let gateway = Arc::new(ScriptedGateway::default());
    let store = StaticCredentialStore::new();
    store.insert(USER, credentials());

    let factory = BrokerFactory::from_config(
        config,
        Arc::new(market),
        Arc::new(audit.clone()),
        Arc::new(ManualClock::frozen_now()),
    )
    .with_live_access(
        Arc::new(store),
        Arc::new(FixedConnector {
            gateway: gateway.clone(),
        }),
    );
    (factory, gateway, audit)
}

async fn harness(risk: RiskLimits) -> Harness {
    let (factory, gateway, audit) = factory(risk);
    let broker = factory.live(USER).await.unwrap();
    Harness {
        broker,
        gateway,
        audit,
        factory,
    }
}

fn limit_buy() -> OrderIntent {
    OrderIntent::limit(MARKET, TOKEN, Side::Buy, dec!(10), dec!(0.50))
}

fn success(result: &OrderResult) -> &Order {
    match result {
        OrderResult::Success { order, .. } => order,
        OrderResult::Failure { reason, error, .. } => {
            panic!("expected success, got {} ({:?})", reason, error)
        }
    }
}

#[tokio::test]
async fn test_accepted_with_fill_is_confirmed_and_filled() {
    let h = harness(RiskLimits::default()).await;
    h.gateway.accept(
        "0xabc",
        OrderStatus::Filled,
        Some(GatewayFill {
            size: dec!(10),
            price: dec!(0.50),
            fees: None,
            liquidity: None,
        }),
    );

    let result = h.broker.place_order(&limit_buy()).await.unwrap();
    let order = success(&result);
    assert_eq!(order.status, OrderStatus::Filled);
    assert_eq!(order.external_id.as_deref(), Some("0xabc"));
    assert_eq!(order.filled_price, Some(dec!(0.50)));
    // Taker fee computed locally: 10 x 0.50 x 60bps
    assert_eq!(order.fees, dec!(0.03));

    let submitted = h.gateway.submitted.lock().clone();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].price, dec!(0.50));

    let positions = h.factory.context().ledger.list_positions(USER, ExecutionMode::Live, PositionFilter::Open);
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].size, dec!(10));
}

#[tokio::test]
async fn test_venue_reported_maker_fill_keeps_venue_fees() {
    let h = harness(RiskLimits::default()).await;
    h.gateway.accept(
        "0xdef",
        OrderStatus::PartiallyFilled,
        Some(GatewayFill {
            size: dec!(4),
            price: dec!(0.50),
            fees: Some(dec!(0.001)),
            liquidity: Some(Liquidity::Maker),
        }),
    );

    let result = h.broker.place_order(&limit_buy()).await.unwrap();
    let order = success(&result);
    assert_eq!(order.status, OrderStatus::PartiallyFilled);
    assert_eq!(order.filled_size, dec!(4));
    assert_eq!(order.fees, dec!(0.001));
}

#[tokio::test]
async fn test_filled_status_without_fill_report_uses_submitted_price() {
    let h = harness(RiskLimits::default()).await;
    h.gateway.accept("0x1", OrderStatus::Filled, None);

    let market_buy = OrderIntent::market(MARKET, TOKEN, Side::Buy, dec!(10));
    let result = h.broker.place_order(&market_buy).await.unwrap();
    let order = success(&result);

    // Market orders go to the venue at the current ask
    assert_eq!(h.gateway.submitted.lock()[0].price, dec!(0.55));
    assert_eq!(order.status, OrderStatus::Filled);
    assert_eq!(order.filled_price, Some(dec!(0.55)));
}

#[tokio::test]
async fn test_accepted_resting_order_then_cancelled_at_venue() {
    let h = harness(RiskLimits::default()).await;
    h.gateway.accept("0xrest", OrderStatus::Open, None);

    let result = h.broker.place_order(&limit_buy()).await.unwrap();
    let order = success(&result).clone();
    assert_eq!(order.status, OrderStatus::Open);
    assert_eq!(h.broker.get_open_orders().await.unwrap().len(), 1);

    let cancelled = h.broker.cancel_order(order.id).await.unwrap();
    assert!(cancelled.is_cancelled());
    assert_eq!(h.gateway.cancelled.lock().clone(), vec!["0xrest".to_string()]);
    assert_eq!(
        h.factory.context().ledger.get_order(order.id).unwrap().status,
        OrderStatus::Cancelled
    );
    assert_eq!(h.audit.count(actions::ORDER_CANCELLED), 1);
}

#[tokio::test]
async fn test_venue_cancel_failure_leaves_order_open() {
    let h = harness(RiskLimits::default()).await;
    h.gateway.accept("0xstuck", OrderStatus::Open, None);
    let result = h.broker.place_order(&limit_buy()).await.unwrap();
    let order_id = success(&result).id;

    *h.gateway.cancel_error.lock() = Some(GatewayError::Cancellation("order already matched".to_string()));
    let outcome = h.broker.cancel_order(order_id).await.unwrap();
    assert_eq!(
        outcome,
        CancelResult::NotCancelled {
            reason: "order already matched".to_string()
        }
    );
    assert_eq!(
        h.factory.context().ledger.get_order(order_id).unwrap().status,
        OrderStatus::Open
    );
}

#[tokio::test]
async fn test_venue_rejection_marks_order_failed() {
    let h = harness(RiskLimits::default()).await;
    h.gateway.push(Ok(SubmitOutcome::Rejected {
        message: "not enough balance / allowance".to_string(),
    }));

    let result = h.broker.place_order(&limit_buy()).await.unwrap();
    assert_eq!(result.reason(), Some("Order failed"));
    assert_eq!(result.error(), Some("not enough balance / allowance"));

    let order = result.order().unwrap();
    assert_eq!(order.status, OrderStatus::Failed);
    assert_eq!(order.error_message.as_deref(), Some("not enough balance / allowance"));
    assert!(h.broker.get_open_orders().await.unwrap().is_empty());
    assert_eq!(h.audit.count(actions::ORDER_FAILED), 1);
}

#[tokio::test]
async fn test_gateway_error_surfaces_message_verbatim() {
    let h = harness(RiskLimits::default()).await;
    h.gateway.push(Err(GatewayError::Submission("503 Service Unavailable".to_string())));

    let result = h.broker.place_order(&limit_buy()).await.unwrap();
    assert!(!result.is_success());
    assert_eq!(result.reason(), Some("Order failed"));
    assert_eq!(result.error(), Some("503 Service Unavailable"));
    assert_eq!(result.order().unwrap().status, OrderStatus::Failed);
}

#[tokio::test]
async fn test_uncovered_sell_never_reaches_venue() {
    let h = harness(RiskLimits::default()).await;
    h.gateway.accept("ext-s", OrderStatus::Filled, None);

    let sell = OrderIntent::market(MARKET, TOKEN, Side::Sell, dec!(5));
    assert!(matches!(
        h.broker.place_order(&sell).await,
        Err(BrokerError::NotFound(_))
    ));

    let ctx = h.factory.context();
    assert!(h.gateway.submitted.lock().is_empty());
    assert!(ctx.ledger.list_orders(USER, ExecutionMode::Live).is_empty());
    assert_eq!(ctx.risk.rate_limiter().usage(USER, ExecutionMode::Live, ctx.now()), 0);
}

#[tokio::test]
async fn test_unrecordable_venue_fill_marks_order_failed() {
    let h = harness(RiskLimits::default()).await;
    h.gateway.accept("ext-b", OrderStatus::Filled, None);
    let buy = OrderIntent::market(MARKET, TOKEN, Side::Buy, dec!(5));
    success(&h.broker.place_order(&buy).await.unwrap());

    // Venue reports more than was asked for
    h.gateway.accept(
        "ext-s",
        OrderStatus::Filled,
        Some(GatewayFill {
            size: dec!(6),
            price: dec!(0.45),
            fees: None,
            liquidity: None,
        }),
    );
    let sell = OrderIntent::market(MARKET, TOKEN, Side::Sell, dec!(5));
    let result = h.broker.place_order(&sell).await.unwrap();

    assert_eq!(result.reason(), Some("Order failed"));
    assert!(result.error().unwrap().starts_with("Venue fill not recorded"));
    let order = result.order().unwrap();
    assert_eq!(order.status, OrderStatus::Failed);
    assert_eq!(order.external_id.as_deref(), Some("ext-s"));
    assert_eq!(order.filled_size, Decimal::ZERO);

    assert!(h.broker.get_open_orders().await.unwrap().is_empty());
    assert_eq!(h.audit.count(actions::ORDER_FAILED), 1);
    let positions = h
        .factory
        .context()
        .ledger
        .list_positions(USER, ExecutionMode::Live, PositionFilter::Open);
    assert_eq!(positions[0].size, dec!(5));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_leaves_order_pending() {
    let h = harness(RiskLimits::default()).await;
    *h.gateway.delay.lock() = Some(Duration::from_secs(30));
    h.gateway.accept("0xlate", OrderStatus::Open, None);

    let result = h.broker.place_order(&limit_buy()).await.unwrap();
    assert_eq!(result.reason(), Some("Order timed out"));
    let order = result.order().unwrap().clone();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.external_id, None);
    assert_eq!(
        h.factory.context().ledger.get_order(order.id).unwrap().status,
        OrderStatus::Pending
    );
    assert_eq!(h.audit.count(actions::ORDER_TIMEOUT), 1);

    // Without a venue id there is nothing to cancel
    let err = h.broker.cancel_order(order.id).await.unwrap_err();
    assert_eq!(err, BrokerError::NotFound("No external order ID".to_string()));
}

#[tokio::test]
async fn test_fourth_live_order_within_a_minute_rejected() {
    let h = harness(RiskLimits {
        max_orders_per_minute: 3,
        ..Default::default()
    })
    .await;
    for i in 0..4 {
        h.gateway.accept(&format!("0x{}", i), OrderStatus::Open, None);
    }

    for _ in 0..3 {
        assert!(h.broker.place_order(&limit_buy()).await.unwrap().is_success());
    }
    let fourth = h.broker.place_order(&limit_buy()).await.unwrap();
    assert_eq!(
        fourth.reason(),
        Some("Rate limit: 3 orders in last minute (max 3)")
    );
    // Rejected before reaching the venue or the ledger
    assert_eq!(h.gateway.submitted.lock().len(), 3);
    assert_eq!(h.factory.context().ledger.list_orders(USER, ExecutionMode::Live).len(), 3);
}

#[tokio::test]
async fn test_kill_switch_blocks_live_orders() {
    let h = harness(RiskLimits::default()).await;
    h.factory.context().risk.activate_kill_switch(USER, "manual halt");

    let result = h.broker.place_order(&limit_buy()).await.unwrap();
    assert_eq!(result.reason(), Some("Kill switch active: manual halt"));
    assert!(h.gateway.submitted.lock().is_empty());
}

#[tokio::test]
async fn test_cancel_all_goes_through_venue() {
    let h = harness(RiskLimits::default()).await;
    h.gateway.accept("0xa", OrderStatus::Open, None);
    h.gateway.accept("0xb", OrderStatus::Open, None);
    h.broker.place_order(&limit_buy()).await.unwrap();
    h.broker.place_order(&limit_buy()).await.unwrap();

    let result = h.broker.cancel_all_orders().await.unwrap();
    assert_eq!(result.cancelled.len(), 2);
    assert_eq!(h.gateway.cancelled.lock().clone(), vec!["*".to_string()]);
}

#[tokio::test]
async fn test_balance_prefers_venue_collateral() {
    let h = harness(RiskLimits::default()).await;
    assert_eq!(h.broker.get_balance().await.unwrap().total, Decimal::ZERO);

    *h.gateway.collateral.lock() = Some(dec!(250));
    let balance = h.broker.get_balance().await.unwrap();
    assert_eq!(balance.available, dec!(250));
    assert_eq!(balance.total, dec!(250));
}

#[tokio::test]
async fn test_missing_credentials_is_authentication_error() {
    let (factory, _, _) = factory(RiskLimits::default());
    let Err(err) = factory.create("stranger", ExecutionMode::Live).await else {
        panic!("live broker without credentials");
    };
    assert!(matches!(err, BrokerError::Authentication(msg) if msg.contains("stranger")));
}

#[tokio::test]
async fn test_decryption_failure_is_authentication_error() {
    let (factory, gateway, _) = factory(RiskLimits::default());
    let factory = factory.with_live_access(
        Arc::new(UndecryptableStore),
        Arc::new(FixedConnector { gateway }),
    );
    let Err(err) = factory.live(USER).await else {
        panic!("undecryptable credentials accepted");
    };
    assert!(matches!(err, BrokerError::Authentication(msg) if msg.contains("key derivation failed")));
}

#[tokio::test]
async fn test_live_requires_connector() {
    let factory = BrokerFactory::from_config(
        MeridianConfig::default(),
        Arc::new(StaticMarketData::new()),
        Arc::new(MemoryAuditSink::new()),
        Arc::new(ManualClock::frozen_now()),
    );
    let Err(err) = factory.create(USER, ExecutionMode::Live).await else {
        panic!("live broker without connector");
    };
    assert!(matches!(err, BrokerError::Gateway(GatewayError::Connection(_))));
}
