//! # Shared TTL cache
//!
//! Process-wide in-memory store mapping string keys to values with expiry.
//! This is the one shared mutable resource of the layer: the query wrapper
//! reads through it, the prefetch scheduler writes ahead into it, and key
//! prefixes (see [`crate::key`]) are the only partitioning.
//!
//! ## Features
//!
//! - **TTL-based expiration**: per-entry expiry, lazy eviction on read plus
//!   an optional background sweep
//! - **LRU capacity eviction**: entry-count bound for long-lived sessions
//! - **Generic payloads**: `TtlCache<V>`; the shared instance stores
//!   `serde_json::Value` rows
//! - **Metrics**: hit/miss/eviction counters with derived rates
//!
//! ## Example
//!
//! ```rust
//! use bazaar_cache::cache::{CacheConfig, SharedCache};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let config = CacheConfig::builder()
//!     .default_ttl(Duration::from_secs(300))
//!     .max_entries(1_000)
//!     .build();
//!
//! let cache = SharedCache::new(config);
//!
//! cache
//!     .insert_with_ttl(
//!         "listing:42".to_string(),
//!         serde_json::json!({"id": 42, "name": "Widget"}),
//!         Duration::from_secs(5),
//!     )
//!     .await;
//!
//! if let Some(value) = cache.get("listing:42").await {
//!     println!("Cache hit: {}", value);
//! }
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod store;
pub mod types;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use entry::{CacheEntry, EntryMetadata};
pub use store::{start_auto_cleanup, SharedCache, TtlCache};
pub use types::{CacheKey, CacheStats};
