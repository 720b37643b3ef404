//! TTL cache store with lazy expiry and LRU capacity eviction
//!
//! The store is the one shared mutable resource of this layer. All mutation
//! happens inside a single lock acquisition, so concurrent writers resolve
//! last-writer-wins and reads never observe a torn entry. Expired entries
//! are treated as absent and removed on read; a background sweep
//! ([`start_auto_cleanup`]) clears entries that are never read again.

use crate::cache::{
    config::CacheConfig,
    entry::CacheEntry,
    types::{CacheKey, CacheStats},
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Generic TTL cache with per-entry expiry and LRU capacity eviction
pub struct TtlCache<V> {
    /// Cache configuration
    pub(crate) config: CacheConfig,

    /// Internal storage
    store: RwLock<CacheStore<V>>,
}

/// The process-wide shared cache instance type
///
/// Every component of this layer reads and writes the same
/// `Arc<SharedCache>`; key prefixes (see [`crate::key`]) keep them out of
/// each other's way.
pub type SharedCache = TtlCache<serde_json::Value>;

/// Internal cache storage
struct CacheStore<V> {
    /// Main storage: key -> entry
    entries: HashMap<CacheKey, CacheEntry<V>>,

    /// LRU tracking: maintains access order, least recent at the front
    lru_queue: VecDeque<CacheKey>,

    /// Current cache statistics
    stats: CacheStats,
}

impl<V: Clone> TtlCache<V> {
    /// Create a new cache with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        info!(
            max_entries = config.max_entries,
            default_ttl_secs = config.default_ttl.as_secs(),
            "Initializing TTL cache"
        );

        let store = CacheStore {
            entries: HashMap::new(),
            lru_queue: VecDeque::new(),
            stats: CacheStats::default(),
        };

        Self {
            config,
            store: RwLock::new(store),
        }
    }

    /// Insert a value using the configured default TTL (with jitter)
    pub async fn insert(&self, key: CacheKey, value: V) {
        let ttl = self.config.ttl_with_jitter();
        self.insert_with_ttl(key, value, ttl).await;
    }

    /// Insert a value expiring `ttl` from now
    ///
    /// Fully replaces any existing entry for the key, value and expiry both.
    pub async fn insert_with_ttl(&self, key: CacheKey, value: V, ttl: Duration) {
        let entry = CacheEntry::new(key.clone(), value, ttl);
        let mut store = self.store.write().await;

        if let Some(existing) = store.entries.get_mut(&key) {
            debug!(%key, "Replacing cache entry");
            *existing = entry;
            store.lru_queue.retain(|k| k != &key);
            store.lru_queue.push_back(key);
        } else {
            self.evict_for_capacity(&mut store);
            debug!(%key, ttl_ms = ttl.as_millis() as u64, "Inserting cache entry");
            store.entries.insert(key.clone(), entry);
            store.lru_queue.push_back(key);
        }

        store.stats.entries = store.entries.len();
    }

    /// Get a fresh value from the cache
    ///
    /// Expired entries are treated as absent and removed (lazy eviction).
    pub async fn get(&self, key: &str) -> Option<V> {
        self.get_with_age(key).await.map(|(value, _)| value)
    }

    /// Get a fresh value together with its age
    ///
    /// Same semantics as [`get`](Self::get); the age lets callers apply their
    /// own staleness window on top of the TTL.
    pub async fn get_with_age(&self, key: &str) -> Option<(V, Duration)> {
        let mut store = self.store.write().await;

        let Some(entry) = store.entries.get(key) else {
            debug!(%key, "Cache miss");
            store.stats.misses += 1;
            return None;
        };

        if entry.is_expired() {
            debug!(%key, "Cache entry expired");
            store.stats.misses += 1;
            store.stats.evictions_ttl += 1;
            Self::remove_entry(&mut store, key);
            return None;
        }

        let value = entry.value.clone();
        let age = entry.age();

        if let Some(entry) = store.entries.get_mut(key) {
            entry.mark_accessed();
        }
        store.stats.hits += 1;

        // Move to the back of the LRU queue (most recently used)
        store.lru_queue.retain(|k| k != key);
        store.lru_queue.push_back(key.to_string());

        debug!(%key, "Cache hit");
        Some((value, age))
    }

    /// Check whether a fresh entry exists for the key
    ///
    /// Applies the same freshness rule as [`get`](Self::get) but does not
    /// touch access metadata or hit/miss counters.
    pub async fn contains(&self, key: &str) -> bool {
        let store = self.store.read().await;
        store
            .entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    /// Remove a specific entry from the cache
    pub async fn remove(&self, key: &str) -> Option<V> {
        let mut store = self.store.write().await;

        let removed = Self::remove_entry(&mut store, key);
        if removed.is_some() {
            store.stats.invalidations += 1;
            debug!(%key, "Removed cache entry");
        }
        removed.map(|entry| entry.value)
    }

    /// Clear all entries from the cache
    pub async fn clear(&self) {
        let mut store = self.store.write().await;

        let count = store.entries.len();
        store.entries.clear();
        store.lru_queue.clear();
        store.stats.entries = 0;
        store.stats.invalidations += count as u64;

        info!(count, "Cleared cache");
    }

    /// Remove all expired entries, returning how many were swept
    pub async fn cleanup_expired(&self) -> usize {
        let mut store = self.store.write().await;

        let expired_keys: Vec<CacheKey> = store
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            Self::remove_entry(&mut store, key);
        }
        store.stats.evictions_ttl += expired_keys.len() as u64;

        if !expired_keys.is_empty() {
            debug!(count = expired_keys.len(), "Swept expired entries");
        }

        expired_keys.len()
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        store.stats.clone()
    }

    /// Get number of entries in cache (live and not-yet-swept expired)
    pub async fn len(&self) -> usize {
        let store = self.store.read().await;
        store.entries.len()
    }

    /// Check if cache is empty
    pub async fn is_empty(&self) -> bool {
        let store = self.store.read().await;
        store.entries.is_empty()
    }

    /// Internal: Remove an entry from the store
    fn remove_entry(store: &mut CacheStore<V>, key: &str) -> Option<CacheEntry<V>> {
        let removed = store.entries.remove(key);
        if removed.is_some() {
            store.lru_queue.retain(|k| k != key);
            store.stats.entries = store.entries.len();
        }
        removed
    }

    /// Internal: Make room for one new entry when at the capacity limit
    fn evict_for_capacity(&self, store: &mut CacheStore<V>) {
        while store.entries.len() >= self.config.max_entries {
            if let Some(key) = store.lru_queue.pop_front() {
                debug!(%key, "Evicting entry at capacity limit");
                store.entries.remove(&key);
                store.stats.evictions_capacity += 1;
            } else {
                warn!("LRU queue empty while cache at capacity");
                break;
            }
        }
        store.stats.entries = store.entries.len();
    }
}

/// Background task for automatic cache cleanup
///
/// Runs until the owning runtime shuts down; sweep failures cannot occur,
/// so the loop only sleeps and sweeps.
pub async fn start_auto_cleanup<V>(cache: Arc<TtlCache<V>>)
where
    V: Clone + Send + Sync + 'static,
{
    let interval = cache.config.cleanup_interval;

    info!(interval_secs = interval.as_secs(), "Starting cache cleanup task");

    loop {
        tokio::time::sleep(interval).await;

        let swept = cache.cleanup_expired().await;
        if swept > 0 {
            debug!(swept, "Auto cleanup pass");
        }
    }
}
