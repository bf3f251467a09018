// Settings Store
//
// Loads business configuration through the persistence adapter and caches the
// resulting snapshot with a time-based TTL. Updates are validated against the
// whole snapshot, written key by key, and invalidate the cache.

use crate::business_rules::{
    error::RulesResult,
    settings::{SettingKey, SettingsSnapshot},
};
use crate::store::PizzeriaStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Default time-to-live for the cached snapshot (60 seconds)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct SettingsCache {
    snapshot: Option<Arc<SettingsSnapshot>>,
    loaded_at: Option<Instant>,
}

impl SettingsCache {
    fn is_stale(&self, ttl: Duration) -> bool {
        match self.loaded_at {
            Some(loaded_at) => self.snapshot.is_none() || loaded_at.elapsed() > ttl,
            None => true,
        }
    }
}

/// Settings Store
///
/// Hands out `Arc<SettingsSnapshot>` values; a snapshot is never mutated once
/// handed out, updates replace it.
pub struct SettingsStore {
    store: Arc<dyn PizzeriaStore>,
    cache: RwLock<SettingsCache>,
    cache_ttl: Duration,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn PizzeriaStore>) -> Self {
        Self::with_ttl(store, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(store: Arc<dyn PizzeriaStore>, cache_ttl: Duration) -> Self {
        Self {
            store,
            cache: RwLock::new(SettingsCache::default()),
            cache_ttl,
        }
    }

    /// Load a fresh snapshot from persistence, bypassing the cache
    pub async fn load(&self) -> RulesResult<SettingsSnapshot> {
        let entries = self.store.load_settings().await?;
        SettingsSnapshot::from_entries(&entries)
    }

    /// Current snapshot, reloaded when the cached one is older than the TTL
    pub async fn snapshot(&self) -> RulesResult<Arc<SettingsSnapshot>> {
        {
            let cache = self.cache.read().await;
            if !cache.is_stale(self.cache_ttl) {
                if let Some(snapshot) = &cache.snapshot {
                    return Ok(snapshot.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;

        // Another task may have refreshed while we waited for the write lock
        if !cache.is_stale(self.cache_ttl) {
            if let Some(snapshot) = &cache.snapshot {
                return Ok(snapshot.clone());
            }
        }

        let snapshot = Arc::new(self.load().await?);
        tracing::debug!("Loaded settings snapshot version {}", snapshot.version);
        cache.snapshot = Some(snapshot.clone());
        cache.loaded_at = Some(Instant::now());
        Ok(snapshot)
    }

    /// Validate and persist one key, then return the refreshed snapshot
    ///
    /// # Arguments
    /// * `key` - One of the setting keys, e.g. `"delivery_fee"`
    /// * `value` - New JSON value, checked against the rest of the snapshot
    ///
    /// # Returns
    /// * `Ok(Arc<SettingsSnapshot>)` - The snapshot including the change
    /// * `Err(InvalidConfiguration)` - Unknown key or a value that does not fit
    pub async fn update(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> RulesResult<Arc<SettingsSnapshot>> {
        let key: SettingKey = key.parse()?;

        let current = self.load().await?;
        let next = current.with_value(key, value)?;
        let serialized = next.value_for(key)?;

        let entry = self.store.save_setting(key.as_str(), &serialized).await?;
        tracing::info!("Setting '{}' updated to version {}", entry.key, entry.version);

        self.invalidate().await;
        self.snapshot().await
    }

    /// Force the next access to reload from persistence
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        cache.snapshot = None;
        cache.loaded_at = None;
    }
}
