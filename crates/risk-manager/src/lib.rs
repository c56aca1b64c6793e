//! Meridian Risk Manager
//!
//! Pre-trade risk gate consulted by every broker before an order reaches
//! execution.
//!
//! ```text
//! place_order
//!     │
//!     ▼
//! can_trade ─── kill switch active? ──────────────► Rejected
//!     │     └── daily loss < -max? ── activate ───► Rejected
//!     ▼
//! pre_trade_check ── BUY: size x price > max position ► Rejected
//!     │          ├── BUY: exposure + value > max ─────► Rejected
//!     │          └── orders in last 60s >= max ───────► Rejected
//!     ▼
//! Approved
//! ```
//!
//! RiskConfig is per user; the rate-limit window is per (user, mode).

mod config_store;
mod error;
mod gate;
mod rate_limiter;

pub use config_store::RiskConfigStore;
pub use error::{Result, RiskError};
pub use gate::{RiskDecision, RiskGate};
pub use rate_limiter::{RateLimitResult, RateLimiter, SlidingWindowRateLimiter};
