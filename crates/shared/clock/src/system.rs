//! Wall-clock time for brokers facing a real venue

use chrono::Utc;
use meridian_core::Timestamp;
use meridian_ports::Clock;

/// Current UTC time from the host
///
/// Order timestamps, the 60 s rate-limit window and the UTC day used by
/// the daily-loss check all follow the host clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn name(&self) -> &str {
        "system"
    }
}
