//! Per-user RiskConfig storage
//!
//! Updates run under the DashMap shard lock for the user's entry, so a
//! gating read never observes a half-applied update.

use dashmap::DashMap;
use meridian_core::{RiskConfig, RiskLimits, Timestamp, UserId};
use std::sync::Arc;

#[derive(Clone)]
pub struct RiskConfigStore {
    configs: Arc<DashMap<UserId, RiskConfig>>,
    defaults: RiskLimits,
}

impl RiskConfigStore {
    pub fn new(defaults: RiskLimits) -> Self {
        Self {
            configs: Arc::new(DashMap::new()),
            defaults,
        }
    }

    pub fn defaults(&self) -> &RiskLimits {
        &self.defaults
    }

    /// Snapshot of the user's config, created with defaults on first access
    pub fn get(&self, user_id: &str, now: Timestamp) -> RiskConfig {
        self.configs
            .entry(user_id.to_string())
            .or_insert_with(|| RiskConfig::new(user_id, self.defaults.clone(), now))
            .clone()
    }

    /// Mutate the user's config atomically
    pub fn update<R>(
        &self,
        user_id: &str,
        now: Timestamp,
        f: impl FnOnce(&mut RiskConfig) -> R,
    ) -> R {
        let mut entry = self
            .configs
            .entry(user_id.to_string())
            .or_insert_with(|| RiskConfig::new(user_id, self.defaults.clone(), now));
        f(entry.value_mut())
    }

    /// Replace the user's config wholesale
    pub fn put(&self, config: RiskConfig) {
        self.configs.insert(config.user_id.clone(), config);
    }
}

impl Default for RiskConfigStore {
    fn default() -> Self {
        Self::new(RiskLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_created_with_defaults() {
        let store = RiskConfigStore::new(RiskLimits {
            max_orders_per_minute: 3,
            ..Default::default()
        });
        let config = store.get("u1", Utc::now());
        assert_eq!(config.limits.max_orders_per_minute, 3);
        assert_eq!(config.limits.max_daily_loss, dec!(100));
        assert!(!config.kill_switch.active);
    }

    #[test]
    fn test_update_is_visible_to_clones() {
        let store = RiskConfigStore::default();
        let other = store.clone();
        let now = Utc::now();

        let activated = store.update("u1", now, |c| c.activate_kill_switch("manual", now));
        assert!(activated);
        assert!(other.get("u1", now).kill_switch.active);
    }
}
