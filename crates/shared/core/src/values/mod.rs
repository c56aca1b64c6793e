use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Price value - uses Decimal for precision
/// Outcome-token prices live in (0, 1]
pub type Price = Decimal;

/// Quantity value - uses Decimal for precision
pub type Quantity = Decimal;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Identifier of the account owner
pub type UserId = String;

/// Identifier of a prediction market
pub type MarketId = String;

/// Identifier of an outcome token within a market
pub type TokenId = String;
