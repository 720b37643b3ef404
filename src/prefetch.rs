//! Background prefetching of related and category data
//!
//! On a view or navigation event the scheduler spawns a delayed, low-priority
//! task that pulls likely-next data through the remote data service, writes
//! it into the shared cache, and hands image URLs to the preloader. Prefetch
//! is strictly best-effort: every error is caught, logged, and discarded, and
//! callers may ignore the returned join handle entirely. Tasks are not
//! cancellable; one that outlives its triggering view completes and writes
//! into the TTL'd map.

use crate::cache::SharedCache;
use crate::error::Result;
use crate::key::{category_key, listing_key};
use crate::preload::{ImagePreloader, PreloadPriority};
use crate::service::{DataService, QueryRequest};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Configuration for the prefetch scheduler
#[derive(Debug, Clone)]
pub struct PrefetchConfig {
    /// Collection holding the listings
    pub collection: String,

    /// Column holding the listing id
    pub id_column: String,

    /// Column holding the listing category
    pub category_column: String,

    /// Column used as the popularity signal
    pub popularity_column: String,

    /// Column holding the primary image URL
    pub image_column: String,

    /// Maximum related listings fetched per subject
    pub related_limit: usize,

    /// Maximum listings fetched per category
    pub category_limit: usize,

    /// Delay before a related prefetch starts
    /// Keeps the fetch off the critical rendering path of the trigger
    pub related_delay: Duration,

    /// Delay before a category prefetch starts
    pub category_delay: Duration,

    /// TTL for individually cached listings
    pub item_ttl: Duration,

    /// TTL for cached category lists
    pub category_ttl: Duration,

    /// How many of a category's images are preloaded
    pub preload_prefix: usize,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            collection: "listings".to_string(),
            id_column: "id".to_string(),
            category_column: "category".to_string(),
            popularity_column: "view_count".to_string(),
            image_column: "image_url".to_string(),
            related_limit: 6,
            category_limit: 12,
            related_delay: Duration::from_millis(500),
            category_delay: Duration::from_secs(2),
            item_ttl: Duration::from_secs(300),
            category_ttl: Duration::from_secs(600),
            preload_prefix: 4,
        }
    }
}

impl PrefetchConfig {
    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.collection.is_empty() {
            return Err("collection must not be empty".to_string());
        }
        if self.related_limit == 0 || self.category_limit == 0 {
            return Err("fetch limits must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Best-effort counters for prefetch activity
#[derive(Debug, Default)]
pub struct PrefetchStats {
    scheduled: AtomicU64,
    completed: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

impl PrefetchStats {
    /// Take a snapshot of the counters
    pub fn snapshot(&self) -> PrefetchStatsSnapshot {
        PrefetchStatsSnapshot {
            scheduled: self.scheduled.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`PrefetchStats`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefetchStatsSnapshot {
    pub scheduled: u64,
    pub completed: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Transient description of one scheduled prefetch, for log correlation
#[derive(Debug, Clone)]
struct PrefetchTask {
    id: Uuid,
    cache_key: String,
    delay: Duration,
    priority: PreloadPriority,
}

/// Why a prefetch finished without caching anything
enum Outcome {
    Completed { cached: usize },
    Skipped(&'static str),
}

/// Schedules delayed background prefetches against the shared cache
pub struct PrefetchScheduler<S> {
    cache: Arc<SharedCache>,
    service: Arc<S>,
    preloader: Arc<ImagePreloader>,
    config: PrefetchConfig,
    stats: Arc<PrefetchStats>,
}

impl<S> PrefetchScheduler<S>
where
    S: DataService + 'static,
{
    /// Create a scheduler with the default configuration
    pub fn new(cache: Arc<SharedCache>, service: Arc<S>, preloader: Arc<ImagePreloader>) -> Self {
        Self::with_config(cache, service, preloader, PrefetchConfig::default())
    }

    /// Create a scheduler with a custom configuration
    pub fn with_config(
        cache: Arc<SharedCache>,
        service: Arc<S>,
        preloader: Arc<ImagePreloader>,
        config: PrefetchConfig,
    ) -> Self {
        Self {
            cache,
            service,
            preloader,
            config,
            stats: Arc::new(PrefetchStats::default()),
        }
    }

    /// Counters for prefetch activity
    pub fn stats(&self) -> PrefetchStatsSnapshot {
        self.stats.snapshot()
    }

    /// Prefetch listings related to a subject the user is viewing
    ///
    /// After a short delay, resolves the subject's category and pulls the
    /// most popular other listings of that category into the cache, keyed
    /// individually; their images are handed to the preloader. A subject
    /// with no category is a silent skip, not an error.
    pub fn prefetch_related(&self, subject_id: &str) -> JoinHandle<()> {
        let task = PrefetchTask {
            id: Uuid::new_v4(),
            cache_key: listing_key(subject_id),
            delay: self.config.related_delay,
            priority: PreloadPriority::Low,
        };
        debug!(
            task_id = %task.id,
            subject = %subject_id,
            delay_ms = task.delay.as_millis() as u64,
            "Scheduling related prefetch"
        );
        self.stats.scheduled.fetch_add(1, Ordering::Relaxed);

        let cache = self.cache.clone();
        let service = self.service.clone();
        let preloader = self.preloader.clone();
        let config = self.config.clone();
        let stats = self.stats.clone();
        let subject_id = subject_id.to_string();

        tokio::spawn(async move {
            let outcome = run_related(cache, service, preloader, &config, &subject_id, &task).await;
            settle(&stats, &task, outcome);
        })
    }

    /// Prefetch a category's listing page ahead of navigation
    ///
    /// Short-circuits when the category key is already warm; otherwise,
    /// after a longer delay, caches the whole list under one key and
    /// preloads a bounded prefix of its images.
    pub fn prefetch_category(&self, category: &str) -> JoinHandle<()> {
        let task = PrefetchTask {
            id: Uuid::new_v4(),
            cache_key: category_key(category),
            delay: self.config.category_delay,
            priority: PreloadPriority::Low,
        };
        debug!(
            task_id = %task.id,
            %category,
            delay_ms = task.delay.as_millis() as u64,
            "Scheduling category prefetch"
        );
        self.stats.scheduled.fetch_add(1, Ordering::Relaxed);

        let cache = self.cache.clone();
        let service = self.service.clone();
        let preloader = self.preloader.clone();
        let config = self.config.clone();
        let stats = self.stats.clone();
        let category = category.to_string();

        tokio::spawn(async move {
            let outcome = run_category(cache, service, preloader, &config, &category, &task).await;
            settle(&stats, &task, outcome);
        })
    }
}

/// Internal: record and log how a prefetch task ended
///
/// Errors stop here; nothing propagates to the flow that scheduled the task.
fn settle(stats: &PrefetchStats, task: &PrefetchTask, outcome: Result<Outcome>) {
    match outcome {
        Ok(Outcome::Completed { cached }) => {
            stats.completed.fetch_add(1, Ordering::Relaxed);
            debug!(task_id = %task.id, cached, "Prefetch complete");
        }
        Ok(Outcome::Skipped(reason)) => {
            stats.skipped.fetch_add(1, Ordering::Relaxed);
            debug!(task_id = %task.id, reason, "Prefetch skipped");
        }
        Err(e) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            warn!(task_id = %task.id, error = %e, "Prefetch failed; discarding");
        }
    }
}

async fn run_related<S: DataService>(
    cache: Arc<SharedCache>,
    service: Arc<S>,
    preloader: Arc<ImagePreloader>,
    config: &PrefetchConfig,
    subject_id: &str,
    task: &PrefetchTask,
) -> Result<Outcome> {
    tokio::time::sleep(task.delay).await;

    let subject_rows = service
        .query(
            QueryRequest::collection(config.collection.as_str())
                .filter_eq(config.id_column.as_str(), json!(subject_id))
                .limit(1),
        )
        .await?;

    let Some(category) = subject_rows
        .first()
        .and_then(|row| row.get(config.category_column.as_str()))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
    else {
        return Ok(Outcome::Skipped("subject or category missing"));
    };

    let related = service
        .query(
            QueryRequest::collection(config.collection.as_str())
                .filter_eq(config.category_column.as_str(), json!(category))
                .filter_ne(config.id_column.as_str(), json!(subject_id))
                .order_desc(config.popularity_column.as_str())
                .limit(config.related_limit),
        )
        .await?;

    if related.is_empty() {
        return Ok(Outcome::Skipped("no related listings"));
    }

    let mut cached = 0;
    let mut images = Vec::new();
    for row in &related {
        let Some(id) = row_id(row, config.id_column.as_str()) else {
            continue;
        };
        cache
            .insert_with_ttl(listing_key(&id), row.clone(), config.item_ttl)
            .await;
        cached += 1;

        if let Some(url) = row.get(config.image_column.as_str()).and_then(|v| v.as_str()) {
            images.push(url.to_string());
        }
    }

    preloader.preload(&images, task.priority);
    Ok(Outcome::Completed { cached })
}

async fn run_category<S: DataService>(
    cache: Arc<SharedCache>,
    service: Arc<S>,
    preloader: Arc<ImagePreloader>,
    config: &PrefetchConfig,
    category: &str,
    task: &PrefetchTask,
) -> Result<Outcome> {
    if cache.contains(&task.cache_key).await {
        return Ok(Outcome::Skipped("category already warm"));
    }

    tokio::time::sleep(task.delay).await;

    let rows = service
        .query(
            QueryRequest::collection(config.collection.as_str())
                .filter_eq(config.category_column.as_str(), json!(category))
                .order_desc(config.popularity_column.as_str())
                .limit(config.category_limit),
        )
        .await?;

    if rows.is_empty() {
        return Ok(Outcome::Skipped("no listings in category"));
    }

    let images: Vec<String> = rows
        .iter()
        .take(config.preload_prefix)
        .filter_map(|row| row.get(config.image_column.as_str()).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
        .collect();

    cache
        .insert_with_ttl(task.cache_key.clone(), Value::Array(rows), config.category_ttl)
        .await;

    preloader.preload(&images, task.priority);
    Ok(Outcome::Completed { cached: 1 })
}

/// Extract a row id as a string; listing ids arrive as strings or numbers
fn row_id(row: &Value, id_column: &str) -> Option<String> {
    match row.get(id_column)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
