//! Per-position write serialization

use dashmap::DashMap;
use meridian_core::PositionKey;
use parking_lot::Mutex;
use std::sync::Arc;

/// One mutex per position key, created on first use
///
/// Fills on the same (user, market, token, mode) run one at a time;
/// different keys never contend.
#[derive(Default)]
pub(crate) struct KeyedLocks {
    locks: DashMap<PositionKey, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub(crate) fn for_key(&self, key: &PositionKey) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.get(key) {
            return Arc::clone(lock.value());
        }
        Arc::clone(self.locks.entry(key.clone()).or_default().value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::ExecutionMode;

    #[test]
    fn test_same_key_shares_lock() {
        let locks = KeyedLocks::default();
        let key = PositionKey::new("u1", "m1", "t1", ExecutionMode::Paper);

        let a = locks.for_key(&key);
        let b = locks.for_key(&key);
        assert!(Arc::ptr_eq(&a, &b));

        let other = PositionKey::new("u1", "m1", "t1", ExecutionMode::Live);
        assert!(!Arc::ptr_eq(&a, &locks.for_key(&other)));
    }
}
