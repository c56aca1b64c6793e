//! Meridian Ledger
//!
//! The order/position data store and its invariant-preserving mutations.
//!
//! - **Orders**: monotonic lifecycle, `filled_size <= size`, `fees >= 0`
//! - **Positions**: one per (user, market, token, mode); size-weighted
//!   average entry on buys, realized P&L on sells, closed at size zero
//! - **Balances**: cash projection from a starting balance
//!
//! ## Concurrency
//!
//! ```text
//!   apply_fill(order A) ─┐
//!                        ├─► KeyedLocks[(user, market, token, mode)] ─► order + position RMW
//!   apply_fill(order B) ─┘
//! ```
//!
//! Fills on the same position key are serialized; different keys proceed
//! in parallel. Single-record transitions (cancel, confirm, fail) are atomic
//! on the order's map entry.

mod error;
mod ledger;
mod locks;

pub use error::{LedgerError, Result};
pub use ledger::{FillOutcome, InitialState, Ledger, PositionFilter};
