//! In-process adapters for the ports
//!
//! Suitable for paper sessions, the runner binary and tests. Venue
//! integrations live outside this crate.

mod audit;
mod credentials;
mod market_data;

pub use audit::{LogAuditSink, MemoryAuditSink};
pub use credentials::StaticCredentialStore;
pub use market_data::StaticMarketData;
