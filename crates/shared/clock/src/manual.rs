use chrono::{Duration, Utc};
use meridian_core::Timestamp;
use meridian_ports::Clock;
use parking_lot::RwLock;
use std::sync::Arc;

/// Clock whose time only changes through [`advance`](Self::advance) or
/// [`set`](Self::set)
///
/// Cloning shares the underlying time, so a test can hold one handle while
/// the components under test hold others.
#[derive(Clone)]
pub struct ManualClock {
    current: Arc<RwLock<Timestamp>>,
}

impl ManualClock {
    /// Start frozen at `time`
    pub fn at(time: Timestamp) -> Self {
        Self {
            current: Arc::new(RwLock::new(time)),
        }
    }

    /// Start frozen at the current wall-clock time
    pub fn frozen_now() -> Self {
        Self::at(Utc::now())
    }

    /// Move time forward
    pub fn advance(&self, duration: Duration) {
        *self.current.write() += duration;
    }

    /// Jump to an explicit time (may move backwards)
    pub fn set(&self, time: Timestamp) {
        *self.current.write() = time;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.read()
    }

    fn name(&self) -> &str {
        "ManualClock"
    }
}
