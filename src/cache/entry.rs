//! Cache entry management with TTL support
//!
//! Expiry is tracked with [`tokio::time::Instant`] so the paused test clock
//! can drive expiration deterministically. Wall-clock creation time is kept
//! alongside for logs and diagnostics only.

use crate::cache::types::CacheKey;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// A cache entry with TTL and access metadata
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cache key
    pub key: CacheKey,

    /// The cached value
    pub value: V,

    /// Entry metadata
    pub metadata: EntryMetadata,
}

impl<V> CacheEntry<V> {
    /// Create a new cache entry expiring `ttl` from now
    pub fn new(key: CacheKey, value: V, ttl: Duration) -> Self {
        let now = Instant::now();

        Self {
            key,
            value,
            metadata: EntryMetadata {
                created_at: Utc::now(),
                stored_at: now,
                expires_at: now + ttl,
                accessed_at: now,
                access_count: 0,
            },
        }
    }

    /// Check if the entry has expired
    ///
    /// An entry is fresh only while `now < expires_at`; at the expiry
    /// instant itself it is already treated as absent.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.metadata.expires_at
    }

    /// Time since the entry was stored
    pub fn age(&self) -> Duration {
        Instant::now().duration_since(self.metadata.stored_at)
    }

    /// Time remaining until expiration, `None` once expired
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Instant::now();
        if now >= self.metadata.expires_at {
            None
        } else {
            Some(self.metadata.expires_at - now)
        }
    }

    /// Mark the entry as accessed (updates access time and count)
    pub fn mark_accessed(&mut self) {
        self.metadata.accessed_at = Instant::now();
        self.metadata.access_count += 1;
    }
}

/// Metadata associated with a cache entry
#[derive(Debug, Clone)]
pub struct EntryMetadata {
    /// Wall-clock creation time, for logs only
    pub created_at: DateTime<Utc>,

    /// When the entry was stored (monotonic)
    pub stored_at: Instant,

    /// When the entry expires (monotonic)
    pub expires_at: Instant,

    /// Last access time (for LRU tracking)
    pub accessed_at: Instant,

    /// Number of times this entry has been read
    pub access_count: u64,
}
