//! Meridian Execution Simulator
//!
//! Turns an order intent and a quote into a simulated fill for paper and
//! shadow trading.
//!
//! ```text
//!   Quote ──► resolve_quote (fallback on DataSourceError)
//!               │
//!   Intent ─────┼──► market-type ──► base (ask/bid) ± slippage ──► taker fee ──► Fill
//!               └──► limit-type ───► crosses? ── yes ─► (as above, capped at limit)
//!                                             └─ no ──► Resting
//!
//!   Resting order + later quote ──► fill_resting ──► limit price, maker fee
//! ```

mod fees;
mod math;
mod simulator;
mod slippage;

pub use fees::FeeSchedule;
pub use math::sqrt_decimal;
pub use simulator::{
    ExecutionConfig, ExecutionSimulator, FallbackQuote, ResolvedQuote, SimulatedExecution,
};
pub use slippage::{
    FixedSlippage, NoSlippage, ProportionalSlippage, RealisticSlippage, SlippageConfig,
    SlippageModel,
};
