//! Error types for the broker crate

use meridian_core::ValidationError;
use meridian_ledger::LedgerError;
use meridian_ports::{CredentialError, GatewayError};
use thiserror::Error;

/// Systemic broker failures
///
/// Risk rejections and venue refusals are not errors; they come back as
/// `OrderResult::Failure` / `CancelResult::NotCancelled`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("Invalid order: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

impl From<LedgerError> for BrokerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Validation(v) => BrokerError::Validation(v),
            LedgerError::NotFound(what) => BrokerError::NotFound(what),
            other @ (LedgerError::InvalidState { .. } | LedgerError::InvalidFill(_)) => {
                BrokerError::InvalidState(other.to_string())
            }
        }
    }
}

impl From<CredentialError> for BrokerError {
    fn from(e: CredentialError) -> Self {
        BrokerError::Authentication(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BrokerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::{ExecutionMode, Order, OrderIntent, OrderStatus, Side};
    use rust_decimal_macros::dec;

    #[test]
    fn test_ledger_errors_map_to_taxonomy() {
        let not_found: BrokerError = LedgerError::NotFound("Order x".to_string()).into();
        assert_eq!(not_found, BrokerError::NotFound("Order x".to_string()));

        let intent = OrderIntent::market("m1", "yes", Side::Buy, dec!(1));
        let order = Order::from_intent("u1", &intent, ExecutionMode::Paper, OrderStatus::Filled, chrono::Utc::now());
        let invalid: BrokerError = LedgerError::InvalidState {
            order_id: order.id,
            status: order.status,
            action: "cancel",
        }
        .into();
        assert!(matches!(invalid, BrokerError::InvalidState(msg) if msg.starts_with("Cannot cancel")));
    }

    #[test]
    fn test_credential_errors_are_authentication_failures() {
        let err: BrokerError = CredentialError::Decryption("bad key".to_string()).into();
        assert!(matches!(err, BrokerError::Authentication(msg) if msg.contains("bad key")));
    }
}
