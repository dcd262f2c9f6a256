//! Cache of generated scene backgrounds, keyed by scene id, expiring after a week.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use engine::persist::{Persistence, load_versioned, save_versioned};
use serde::{Deserialize, Serialize};

pub const BACKGROUND_CACHE_KEY: &str = "darkside-backgrounds";
pub const BACKGROUND_CACHE_VERSION: u32 = 1;

pub fn cache_ttl() -> Duration {
    Duration::days(7)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedBackground {
    pub url: String,
    pub cached_at: DateTime<Utc>,
}

impl CachedBackground {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.cached_at) > cache_ttl()
    }
}

pub struct BackgroundCache<P: Persistence> {
    store: P,
    entries: BTreeMap<String, CachedBackground>,
}

impl<P: Persistence> BackgroundCache<P> {
    pub fn new(store: P) -> Self {
        let entries = load_versioned(&store, BACKGROUND_CACHE_KEY, BACKGROUND_CACHE_VERSION);
        Self { store, entries }
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the cached URL, or `None` on a miss. Expired entries count as a miss
    /// and are evicted from storage.
    pub fn get_cached_background(&mut self, key: &str, now: DateTime<Utc>) -> Option<String> {
        let entry = self.entries.get(key)?;
        if !entry.is_expired(now) {
            return Some(entry.url.clone());
        }
        log::debug!("background {key} expired (cached {})", entry.cached_at);
        self.entries.remove(key);
        self.persist();
        None
    }

    pub fn cache_background(&mut self, key: &str, url: &str, now: DateTime<Utc>) {
        self.entries.insert(
            key.to_string(),
            CachedBackground {
                url: url.to_string(),
                cached_at: now,
            },
        );
        self.persist();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        if let Err(err) = self.store.remove(BACKGROUND_CACHE_KEY) {
            log::warn!("failed to clear background cache: {err}");
        }
    }

    fn persist(&mut self) {
        if let Err(err) = save_versioned(
            &mut self.store,
            BACKGROUND_CACHE_KEY,
            BACKGROUND_CACHE_VERSION,
            &self.entries,
        ) {
            log::warn!("background cache write failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use engine::persist::MemoryStore;

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn fresh_entry_hits() {
        let mut cache = BackgroundCache::new(MemoryStore::new());
        cache.cache_background("stadium-night", "https://cdn/a.png", t0());
        let later = t0() + Duration::days(6);
        assert_eq!(
            cache.get_cached_background("stadium-night", later).as_deref(),
            Some("https://cdn/a.png")
        );
        assert_eq!(cache.get_cached_background("missing", later), None);
    }

    #[test]
    fn exactly_seven_days_is_still_fresh() {
        let mut cache = BackgroundCache::new(MemoryStore::new());
        cache.cache_background("k", "u", t0());
        assert!(cache.get_cached_background("k", t0() + cache_ttl()).is_some());
    }

    #[test]
    fn expired_entry_misses_and_is_removed_from_storage() {
        let mut cache = BackgroundCache::new(MemoryStore::new());
        cache.cache_background("old", "https://cdn/old.png", t0());
        cache.cache_background("new", "https://cdn/new.png", t0() + Duration::days(5));

        let now = t0() + Duration::days(7) + Duration::seconds(1);
        assert_eq!(cache.get_cached_background("old", now), None);
        assert_eq!(cache.len(), 1);

        let raw = cache.store().raw(BACKGROUND_CACHE_KEY).unwrap();
        assert!(!raw.contains("old.png"));
        assert!(raw.contains("new.png"));
    }

    #[test]
    fn reload_restores_entries_and_clear_drops_them() {
        let mut cache = BackgroundCache::new(MemoryStore::new());
        cache.cache_background("k", "u", t0());
        let store = cache.store().clone();

        let mut reloaded = BackgroundCache::new(store);
        assert_eq!(reloaded.get_cached_background("k", t0()).as_deref(), Some("u"));
        reloaded.clear();
        assert!(reloaded.is_empty());
        assert!(reloaded.store().raw(BACKGROUND_CACHE_KEY).is_none());
    }
}
