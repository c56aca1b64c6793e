use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RiskError {
    #[error("Invalid risk limit {field}: {value} (must be positive)")]
    InvalidLimit { field: &'static str, value: Decimal },
}

pub type Result<T> = std::result::Result<T, RiskError>;
