use rust_decimal::Decimal;
use thiserror::Error;

/// Malformed order intent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Order size must be positive, got {0}")]
    NonPositiveSize(Decimal),

    #[error("Order price must be in (0, 1], got {0}")]
    PriceOutOfRange(Decimal),

    #[error("{0} orders require a price")]
    MissingPrice(String),

    #[error("GTD orders require an expiry")]
    MissingExpiry,

    #[error("Missing {0}")]
    MissingField(&'static str),
}
