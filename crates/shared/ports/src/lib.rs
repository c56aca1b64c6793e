//! Meridian Ports
//!
//! Port definitions (traits) for the Meridian execution and risk core.
//! These define the boundaries between the core and its external
//! collaborators: quote feeds, the venue order gateway, credential storage
//! and the audit trail.

mod audit;
mod clock;
mod credentials;
mod error;
mod gateway;
mod market_data;

pub use audit::{AuditCategory, AuditEntry, AuditSink};
pub use clock::Clock;
pub use credentials::{ApiCredentials, CredentialStore};
pub use error::{AuditError, CredentialError, DataSourceError, GatewayError};
pub use gateway::{GatewayConnector, GatewayFill, GatewayOrder, OrderGateway, SubmitOutcome};
pub use market_data::MarketDataSource;
