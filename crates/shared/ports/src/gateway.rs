use async_trait::async_trait;
use meridian_core::{Liquidity, OrderStatus, OrderType, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{ApiCredentials, GatewayError};

/// Order as submitted to the venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub token_id: String,
    pub side: Side,
    pub order_type: OrderType,
    pub size: Decimal,
    pub price: Decimal,
}

/// Authoritative fill report from the venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayFill {
    pub size: Decimal,
    pub price: Decimal,
    /// Fees charged by the venue, computed locally when absent
    pub fees: Option<Decimal>,
    /// Maker/taker classification, taker assumed when absent
    pub liquidity: Option<Liquidity>,
}

/// Venue response to a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubmitOutcome {
    Accepted {
        external_id: String,
        status: OrderStatus,
        fill: Option<GatewayFill>,
    },
    Rejected {
        message: String,
    },
}

/// Port for live order execution
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submit an order; `Err` means transport failure, `Rejected` means the
    /// venue refused it
    async fn submit(&self, order: &GatewayOrder) -> Result<SubmitOutcome, GatewayError>;

    /// Cancel an order by venue id
    async fn cancel(&self, external_id: &str) -> Result<(), GatewayError>;

    /// Cancel every open order of the authenticated account
    async fn cancel_all(&self) -> Result<(), GatewayError>;

    /// Collateral balance held at the venue, if the venue reports one
    async fn collateral_balance(&self) -> Result<Option<Decimal>, GatewayError> {
        Ok(None)
    }
}

/// Builds an authenticated gateway from decrypted credentials
#[async_trait]
pub trait GatewayConnector: Send + Sync {
    async fn connect(
        &self,
        credentials: &ApiCredentials,
    ) -> Result<Arc<dyn OrderGateway>, GatewayError>;
}
