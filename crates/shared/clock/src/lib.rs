//! Meridian Clock Infrastructure
//!
//! Provides time sources for production and tests:
//!
//! - [`SystemClock`]: wall-clock UTC time
//! - [`ManualClock`]: frozen time that only moves when told to, used to
//!   drive rate-limit windows and UTC day rollovers deterministically
//!
//! ## Usage
//!
//! ```ignore
//! use meridian_clock::{Clock, ManualClock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::at(start);
//! clock.advance(Duration::seconds(61)); // slide past a rate-limit window
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use meridian_ports::Clock;
