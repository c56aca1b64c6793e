//! Ledger errors

use meridian_core::{OrderId, OrderStatus, ValidationError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid order: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid fill: {0}")]
    InvalidFill(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Cannot {action} order {order_id} in status {status}")]
    InvalidState {
        order_id: OrderId,
        status: OrderStatus,
        action: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
