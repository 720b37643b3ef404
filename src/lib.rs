//! # Bazaar Cache (bazaar-cache)
//!
//! Client-side caching and prefetching layer for the Bazaar marketplace.
//!
//! The crate is the performance core of a client application talking to a
//! hosted backend: a shared TTL cache, a query wrapper that coalesces
//! concurrent fetches, a navigation pattern tracker that predicts likely
//! next pages, a background prefetch scheduler, and an image preloader.
//! Everything else - auth, schema, transport, rendering - belongs to
//! external collaborators behind the [`service::DataService`] trait.
//!
//! ## Features
//!
//! - TTL cache with lazy expiry, LRU capacity eviction, and metrics
//! - Read-through queries with request coalescing and a one-retry budget
//! - Navigation pattern tracking with bounded capacity and top-3 prediction
//! - Fire-and-forget prefetching that never surfaces errors to the UI
//! - Async-first design using tokio
//!
//! ## Serving a query through the cache
//!
//! ```no_run
//! use bazaar_cache::{CacheConfig, QueryClient, QueryOptions, SharedCache};
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = Arc::new(SharedCache::new(CacheConfig::browsing()));
//!     let client = QueryClient::new(cache);
//!
//!     let listing: Option<Value> = client
//!         .fetch("listing:42", &QueryOptions::default(), || async {
//!             // stands in for the remote data service call
//!             Ok(json!({"id": "42", "name": "Widget"}))
//!         })
//!         .await?;
//!
//!     println!("listing: {:?}", listing);
//!     Ok(())
//! }
//! ```
//!
//! ## Prefetching ahead of navigation
//!
//! ```no_run
//! use bazaar_cache::{
//!     CacheConfig, ImagePreloader, NavigationTracker, PrefetchScheduler, SharedCache,
//!     TracingHinter,
//! };
//! use bazaar_cache::service::MemoryDataService;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = Arc::new(SharedCache::new(CacheConfig::browsing()));
//!     let service = Arc::new(MemoryDataService::new());
//!     let preloader = Arc::new(ImagePreloader::new(Arc::new(TracingHinter)));
//!
//!     let tracker = NavigationTracker::new();
//!     let scheduler = PrefetchScheduler::new(cache, service, preloader);
//!
//!     // A route change: record it and warm what the user views
//!     tracker.track("/home", "/listing/42").await;
//!     let _ = scheduler.prefetch_related("42");
//!
//!     // Warm the categories the tracker expects next
//!     for destination in tracker.predict("/home").await {
//!         if let Some(category) = destination.strip_prefix("/category/") {
//!             let _ = scheduler.prefetch_category(category);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod key;
pub mod nav;
pub mod prefetch;
pub mod preload;
pub mod query;
pub mod service;

// Re-export main types for convenience
pub use cache::{
    start_auto_cleanup, CacheConfig, CacheConfigBuilder, CacheEntry, CacheKey, CacheStats,
    EntryMetadata, SharedCache, TtlCache,
};
pub use error::{CacheError, Result};
pub use key::{category_key, listing_key, CacheKeyBuilder, KeyScope};
pub use nav::{NavigationPattern, NavigationTracker, TrackerConfig};
pub use prefetch::{PrefetchConfig, PrefetchScheduler, PrefetchStats, PrefetchStatsSnapshot};
pub use preload::{ImagePreloader, PreloadPriority, ResourceHinter, TracingHinter};
pub use query::{QueryClient, QueryOptions};
