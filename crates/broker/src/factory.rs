//! Broker construction keyed on execution mode

use log::{error, info};
use meridian_clock::SystemClock;
use meridian_core::ExecutionMode;
use meridian_ports::{AuditSink, Clock, CredentialStore, GatewayConnector, GatewayError, MarketDataSource};
use std::sync::Arc;

use crate::broker::Broker;
use crate::config::MeridianConfig;
use crate::context::BrokerContext;
use crate::error::{BrokerError, Result};
use crate::live::LiveBroker;
use crate::paper::PaperBroker;
use crate::shadow::ShadowBroker;

/// Venue access needed only for LIVE brokers
#[derive(Clone)]
struct LiveAccess {
    credentials: Arc<dyn CredentialStore>,
    connector: Arc<dyn GatewayConnector>,
}

/// Builds brokers that share one ledger, risk gate and simulator
pub struct BrokerFactory {
    ctx: BrokerContext,
    config: MeridianConfig,
    live: Option<LiveAccess>,
}

impl BrokerFactory {
    pub fn new(ctx: BrokerContext, config: MeridianConfig) -> Self {
        Self {
            ctx,
            config,
            live: None,
        }
    }

    /// Wire a fresh context from configuration
    pub fn from_config(
        config: MeridianConfig,
        market_data: Arc<dyn MarketDataSource>,
        audit: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ctx = BrokerContext::new(
            &config.execution,
            config.risk.clone(),
            market_data,
            audit,
            clock,
        );
        Self::new(ctx, config)
    }

    /// Wire a fresh context on the host clock
    pub fn realtime(
        config: MeridianConfig,
        market_data: Arc<dyn MarketDataSource>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self::from_config(config, market_data, audit, Arc::new(SystemClock::new()))
    }

    /// Enable LIVE brokers
    pub fn with_live_access(
        mut self,
        credentials: Arc<dyn CredentialStore>,
        connector: Arc<dyn GatewayConnector>,
    ) -> Self {
        self.live = Some(LiveAccess {
            credentials,
            connector,
        });
        self
    }

    pub fn context(&self) -> &BrokerContext {
        &self.ctx
    }

    pub fn config(&self) -> &MeridianConfig {
        &self.config
    }

    pub async fn create(&self, user_id: &str, mode: ExecutionMode) -> Result<Box<dyn Broker>> {
        let broker: Box<dyn Broker> = match mode {
            ExecutionMode::Paper => Box::new(self.paper(user_id)),
            ExecutionMode::Shadow => Box::new(self.shadow(user_id)),
            ExecutionMode::Live => Box::new(self.live(user_id).await?),
        };
        info!("[FACTORY] Created {} broker for {}", mode, user_id);
        Ok(broker)
    }

    pub fn paper(&self, user_id: &str) -> PaperBroker {
        PaperBroker::new(user_id, self.ctx.clone(), self.config.paper.initial_balance)
    }

    /// Shadow accounts start from the paper balance so the two compare
    pub fn shadow(&self, user_id: &str) -> ShadowBroker {
        ShadowBroker::new(user_id, self.ctx.clone(), self.config.paper.initial_balance)
    }

    /// Load credentials and connect an authenticated gateway
    pub async fn live(&self, user_id: &str) -> Result<LiveBroker> {
        let access = self.live.as_ref().ok_or_else(|| {
            BrokerError::Gateway(GatewayError::Connection(
                "No gateway connector configured".to_string(),
            ))
        })?;

        let credentials = access.credentials.credentials(user_id).await.map_err(|e| {
            error!("[FACTORY] Credentials unavailable for {}: {}", user_id, e);
            BrokerError::from(e)
        })?;
        let gateway = access.connector.connect(&credentials).await?;

        Ok(LiveBroker::new(
            user_id,
            self.ctx.clone(),
            gateway,
            self.config.live.gateway_timeout(),
            self.config.live.initial_balance,
        ))
    }
}
