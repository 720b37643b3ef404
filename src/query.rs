//! Query wrapper with cache read-through and request coalescing
//!
//! Wraps a remote fetch in the shared TTL cache: fresh entries short-circuit
//! the network, misses run the fetch and store the result, and concurrent
//! callers for the same key share a single underlying fetch. Fetch errors
//! propagate to the caller after a small retry budget; this is the
//! foreground, user-visible path (background prefetching swallows errors
//! instead, see [`crate::prefetch`]).

use crate::cache::{CacheKey, SharedCache};
use crate::error::{CacheError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Outcome broadcast to callers joined on one in-flight fetch
type FetchOutcome = std::result::Result<Value, String>;

/// Per-query configuration
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Maximum age at which a cached value is served without refetching
    pub stale_time: Duration,

    /// TTL applied when storing a fetched value
    pub cache_time: Duration,

    /// When false, the query does not fetch at all
    pub enabled: bool,

    /// Retry budget after the first failed attempt
    pub retry: u32,

    /// Delay between retry attempts
    pub retry_delay: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            // Both windows coincide by default: any unexpired entry is a hit
            stale_time: Duration::from_secs(300),
            cache_time: Duration::from_secs(300),
            enabled: true,
            retry: 1,
            retry_delay: Duration::from_millis(250),
        }
    }
}

impl QueryOptions {
    /// Set the staleness window
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    /// Set the storage TTL
    pub fn cache_time(mut self, cache_time: Duration) -> Self {
        self.cache_time = cache_time;
        self
    }

    /// Enable or disable fetching
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the retry budget
    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    /// Set the delay between retries
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

/// Cache-backed query client with request coalescing
pub struct QueryClient {
    cache: Arc<SharedCache>,
    inflight: Mutex<HashMap<CacheKey, broadcast::Sender<FetchOutcome>>>,
}

enum Role {
    Leader(broadcast::Sender<FetchOutcome>),
    Follower(broadcast::Receiver<FetchOutcome>),
}

impl QueryClient {
    /// Create a client over the shared cache instance
    pub fn new(cache: Arc<SharedCache>) -> Self {
        Self {
            cache,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// The shared cache this client reads through
    pub fn cache(&self) -> Arc<SharedCache> {
        self.cache.clone()
    }

    /// Run a query: serve from cache, or fetch and store
    ///
    /// Returns `Ok(None)` only when the query is disabled. Concurrent calls
    /// for the same key while a fetch is in flight all observe the result of
    /// that single fetch.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: &str,
        options: &QueryOptions,
        fetch_fn: F,
    ) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !options.enabled {
            debug!(%key, "Query disabled; skipping fetch");
            return Ok(None);
        }

        if let Some((value, age)) = self.cache.get_with_age(key).await {
            if age <= options.stale_time {
                debug!(%key, age_ms = age.as_millis() as u64, "Query served from cache");
                return Ok(Some(serde_json::from_value(value)?));
            }
            debug!(%key, "Cached value stale; refetching");
        }

        let role = {
            let mut inflight = self.inflight.lock().await;
            match inflight.get(key) {
                Some(sender) => Role::Follower(sender.subscribe()),
                None => {
                    let (tx, _) = broadcast::channel(1);
                    inflight.insert(key.to_string(), tx.clone());
                    Role::Leader(tx)
                }
            }
        };

        match role {
            Role::Follower(mut rx) => {
                debug!(%key, "Joining in-flight fetch");
                match rx.recv().await {
                    Ok(Ok(value)) => Ok(Some(serde_json::from_value(value)?)),
                    Ok(Err(message)) => Err(CacheError::FetchFailed {
                        attempts: options.retry + 1,
                        message,
                    }),
                    Err(_) => Err(CacheError::Other(
                        "in-flight fetch dropped without a result".to_string(),
                    )),
                }
            }
            Role::Leader(tx) => self.lead_fetch(key, options, fetch_fn, tx).await,
        }
    }

    /// Internal: run the fetch as the leader and fan the outcome out
    async fn lead_fetch<T, F, Fut>(
        &self,
        key: &str,
        options: &QueryOptions,
        fetch_fn: F,
        tx: broadcast::Sender<FetchOutcome>,
    ) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = options.retry + 1;
        let mut last_error: Option<CacheError> = None;
        let mut fetched: Option<(T, Value)> = None;

        for attempt in 1..=attempts {
            let start = Instant::now();
            match fetch_fn().await {
                Ok(data) => {
                    debug!(
                        %key,
                        attempt,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Fetch resolved"
                    );
                    match serde_json::to_value(&data) {
                        Ok(value) => fetched = Some((data, value)),
                        Err(e) => last_error = Some(e.into()),
                    }
                    break;
                }
                Err(e) => {
                    warn!(%key, attempt, error = %e, "Fetch attempt failed");
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(options.retry_delay).await;
                    }
                }
            }
        }

        match fetched {
            Some((data, value)) => {
                self.cache
                    .insert_with_ttl(key.to_string(), value.clone(), options.cache_time)
                    .await;
                self.finish(key, Ok(value), &tx).await;
                Ok(Some(data))
            }
            None => {
                let message = last_error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "fetch produced no result".to_string());
                self.finish(key, Err(message.clone()), &tx).await;
                Err(CacheError::FetchFailed { attempts, message })
            }
        }
    }

    /// Internal: retire the in-flight entry, then broadcast the outcome
    ///
    /// The entry must leave the map before the send so that any caller who
    /// found it there has already subscribed.
    async fn finish(&self, key: &str, outcome: FetchOutcome, tx: &broadcast::Sender<FetchOutcome>) {
        self.inflight.lock().await.remove(key);
        let _ = tx.send(outcome);
    }
}
