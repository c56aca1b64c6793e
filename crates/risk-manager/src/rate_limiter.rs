//! Order Rate Limiting
//!
//! Sliding 60-second window per (user, mode). The check and the record of
//! an accepted order happen under one lock, so concurrent submissions on
//! the same key can never both take the last slot.

use chrono::Duration;
use dashmap::DashMap;
use meridian_core::{ExecutionMode, Timestamp, UserId};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Result of a rate limit check
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitResult {
    /// Whether the order is allowed
    pub allowed: bool,
    /// Orders in the window (including this one when allowed)
    pub current: u32,
    /// Maximum allowed
    pub limit: u32,
    /// Time until the oldest entry leaves the window
    pub retry_after: Option<Duration>,
}

impl RateLimitResult {
    pub fn allowed(current: u32, limit: u32) -> Self {
        RateLimitResult {
            allowed: true,
            current,
            limit,
            retry_after: None,
        }
    }

    pub fn denied(current: u32, limit: u32, retry_after: Duration) -> Self {
        RateLimitResult {
            allowed: false,
            current,
            limit,
            retry_after: Some(retry_after),
        }
    }
}

/// Rate limiter for order submissions
pub trait RateLimiter: Send + Sync {
    /// Check and, if allowed, record one order at `now`
    fn try_acquire(
        &self,
        user_id: &str,
        mode: ExecutionMode,
        limit: u32,
        now: Timestamp,
    ) -> RateLimitResult;

    /// Orders recorded in the window ending at `now`
    fn usage(&self, user_id: &str, mode: ExecutionMode, now: Timestamp) -> u32;

    /// Forget all recorded orders for a key
    fn reset(&self, user_id: &str, mode: ExecutionMode);
}

type WindowKey = (UserId, ExecutionMode);

/// In-process sliding window limiter
pub struct SlidingWindowRateLimiter {
    window: Duration,
    entries: Arc<DashMap<WindowKey, Arc<Mutex<VecDeque<Timestamp>>>>>,
}

impl SlidingWindowRateLimiter {
    pub fn new() -> Self {
        Self::with_window(Duration::seconds(60))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            entries: Arc::new(DashMap::new()),
        }
    }

    fn window_for(&self, user_id: &str, mode: ExecutionMode) -> Arc<Mutex<VecDeque<Timestamp>>> {
        self.entries
            .entry((user_id.to_string(), mode))
            .or_default()
            .clone()
    }

    fn prune(&self, timestamps: &mut VecDeque<Timestamp>, now: Timestamp) {
        let cutoff = now - self.window;
        while timestamps.front().is_some_and(|t| *t <= cutoff) {
            timestamps.pop_front();
        }
    }
}

impl Default for SlidingWindowRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter for SlidingWindowRateLimiter {
    fn try_acquire(
        &self,
        user_id: &str,
        mode: ExecutionMode,
        limit: u32,
        now: Timestamp,
    ) -> RateLimitResult {
        let window = self.window_for(user_id, mode);
        let mut timestamps = window.lock();
        self.prune(&mut timestamps, now);

        let current = timestamps.len() as u32;
        if current >= limit {
            let retry_after = timestamps
                .front()
                .map(|oldest| *oldest + self.window - now)
                .unwrap_or(self.window);
            return RateLimitResult::denied(current, limit, retry_after);
        }

        timestamps.push_back(now);
        RateLimitResult::allowed(current + 1, limit)
    }

    fn usage(&self, user_id: &str, mode: ExecutionMode, now: Timestamp) -> u32 {
        let Some(window) = self
            .entries
            .get(&(user_id.to_string(), mode))
            .map(|w| w.clone())
        else {
            return 0;
        };
        let mut timestamps = window.lock();
        self.prune(&mut timestamps, now);
        timestamps.len() as u32
    }

    fn reset(&self, user_id: &str, mode: ExecutionMode) {
        self.entries.remove(&(user_id.to_string(), mode));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_denies_at_limit() {
        let limiter = SlidingWindowRateLimiter::new();
        let now = Utc::now();

        for i in 1..=3 {
            let result = limiter.try_acquire("u1", ExecutionMode::Live, 3, now);
            assert!(result.allowed);
            assert_eq!(result.current, i);
        }

        let result = limiter.try_acquire("u1", ExecutionMode::Live, 3, now);
        assert!(!result.allowed);
        assert_eq!(result.current, 3);
        assert_eq!(result.retry_after, Some(Duration::seconds(60)));
    }

    #[test]
    fn test_window_slides() {
        let limiter = SlidingWindowRateLimiter::new();
        let t0 = Utc::now();

        assert!(limiter.try_acquire("u1", ExecutionMode::Paper, 2, t0).allowed);
        assert!(limiter.try_acquire("u1", ExecutionMode::Paper, 2, t0 + Duration::seconds(30)).allowed);
        assert!(!limiter.try_acquire("u1", ExecutionMode::Paper, 2, t0 + Duration::seconds(59)).allowed);

        // First entry leaves the window at exactly t0 + 60s
        let later = t0 + Duration::seconds(60);
        assert_eq!(limiter.usage("u1", ExecutionMode::Paper, later), 1);
        assert!(limiter.try_acquire("u1", ExecutionMode::Paper, 2, later).allowed);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = SlidingWindowRateLimiter::new();
        let now = Utc::now();

        assert!(limiter.try_acquire("u1", ExecutionMode::Live, 1, now).allowed);
        assert!(limiter.try_acquire("u1", ExecutionMode::Paper, 1, now).allowed);
        assert!(limiter.try_acquire("u2", ExecutionMode::Live, 1, now).allowed);
        assert!(!limiter.try_acquire("u1", ExecutionMode::Live, 1, now).allowed);
    }

    #[test]
    fn test_reset() {
        let limiter = SlidingWindowRateLimiter::new();
        let now = Utc::now();

        limiter.try_acquire("u1", ExecutionMode::Live, 1, now);
        assert_eq!(limiter.usage("u1", ExecutionMode::Live, now), 1);

        limiter.reset("u1", ExecutionMode::Live);
        assert_eq!(limiter.usage("u1", ExecutionMode::Live, now), 0);
        assert!(limiter.try_acquire("u1", ExecutionMode::Live, 1, now).allowed);
    }

    #[test]
    fn test_concurrent_acquire_never_exceeds_limit() {
        let limiter = Arc::new(SlidingWindowRateLimiter::new());
        let now = Utc::now();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..10)
                        .filter(|_| limiter.try_acquire("u1", ExecutionMode::Live, 25, now).allowed)
                        .count()
                })
            })
            .collect();

        let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(granted, 25);
        assert_eq!(limiter.usage("u1", ExecutionMode::Live, now), 25);
    }
}
