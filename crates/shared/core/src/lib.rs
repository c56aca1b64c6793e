//! Meridian Core Domain
//!
//! Pure domain types for the Meridian execution and risk core.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod error;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    Balance,
    // Market data
    MarketState,
    Quote,
    // Core trading entities
    ExecutionMode,
    Fill,
    Liquidity,
    Order,
    OrderId,
    OrderIntent,
    OrderStatus,
    OrderType,
    Position,
    PositionKey,
    Side,
    // Risk types
    KillSwitch,
    RiskConfig,
    RiskLimits,
    RiskLimitsUpdate,
};
pub use error::ValidationError;
pub use values::{MarketId, Price, Quantity, Timestamp, TokenId, UserId};
