//! Integration tests for the full navigation -> prefetch -> query flow
//!
//! Drives the tracker, scheduler, preloader, and query client together over
//! the in-memory data service on the paused tokio clock.

use bazaar_cache::service::{DataService, MemoryDataService, QueryRequest};
use bazaar_cache::{
    CacheConfig, ImagePreloader, NavigationTracker, PrefetchConfig, PrefetchScheduler,
    PreloadPriority, QueryClient, QueryOptions, ResourceHinter, SharedCache,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct RecordingHinter {
    urls: Mutex<Vec<String>>,
}

impl ResourceHinter for RecordingHinter {
    fn request_preload(&self, url: &str, _priority: PreloadPriority) {
        self.urls.lock().unwrap().push(url.to_string());
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("bazaar_cache=debug")
        .with_test_writer()
        .try_init();
}

fn shared_cache() -> Arc<SharedCache> {
    init_tracing();
    let config = CacheConfig::builder()
        .default_ttl(Duration::from_secs(300))
        .ttl_jitter(0.0)
        .build();
    Arc::new(SharedCache::new(config))
}

async fn seeded_service() -> Arc<MemoryDataService> {
    let service = MemoryDataService::new();
    service
        .seed(
            "listings",
            vec![
                json!({"id": "1", "category": "electronics", "view_count": 10, "image_url": "1.jpg"}),
                json!({"id": "2", "category": "electronics", "view_count": 50, "image_url": "2.jpg"}),
                json!({"id": "3", "category": "electronics", "view_count": 30, "image_url": "3.jpg"}),
                json!({"id": "4", "category": "books", "view_count": 99, "image_url": "4.jpg"}),
            ],
        )
        .await;
    Arc::new(service)
}

#[tokio::test(start_paused = true)]
async fn test_view_event_warms_cache_for_later_queries() {
    let cache = shared_cache();
    let service = seeded_service().await;
    let hinter = Arc::new(RecordingHinter::default());
    let scheduler = PrefetchScheduler::new(
        cache.clone(),
        service.clone(),
        Arc::new(ImagePreloader::new(hinter.clone())),
    );

    // The user views listing 1; related listings get prefetched
    scheduler.prefetch_related("1").await.unwrap();

    // A later foreground query for a related listing skips the network
    let client = QueryClient::new(cache);
    let fetches = Arc::new(AtomicUsize::new(0));
    let fetch = {
        let service = service.clone();
        let fetches = fetches.clone();
        move || {
            let service = service.clone();
            let fetches = fetches.clone();
            async move {
                fetches.fetch_add(1, Ordering::SeqCst);
                let rows = service
                    .query(
                        QueryRequest::collection("listings").filter_eq("id", json!("2")).limit(1),
                    )
                    .await?;
                Ok(rows.into_iter().next().unwrap_or(Value::Null))
            }
        }
    };

    let listing: Option<Value> = client
        .fetch("listing:2", &QueryOptions::default(), &fetch)
        .await
        .unwrap();

    assert_eq!(listing.unwrap()["id"], json!("2"));
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
    assert!(!hinter.urls.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_predicted_navigation_warms_category() {
    let cache = shared_cache();
    let service = seeded_service().await;
    let hinter = Arc::new(RecordingHinter::default());
    let scheduler = PrefetchScheduler::new(
        cache.clone(),
        service,
        Arc::new(ImagePreloader::new(hinter)),
    );

    let tracker = NavigationTracker::new();
    for _ in 0..3 {
        tracker.track("/home", "/category/electronics").await;
    }
    tracker.track("/home", "/category/books").await;

    let predictions = tracker.predict("/home").await;
    assert_eq!(
        predictions,
        vec!["/category/electronics", "/category/books"]
    );

    // Warm every predicted category page
    let mut handles = Vec::new();
    for destination in &predictions {
        if let Some(category) = destination.strip_prefix("/category/") {
            handles.push(scheduler.prefetch_category(category));
        }
    }
    for joined in futures::future::join_all(handles).await {
        joined.unwrap();
    }

    let electronics = cache.get("category:electronics").await.unwrap();
    assert_eq!(electronics.as_array().unwrap().len(), 3);
    let books = cache.get("category:books").await.unwrap();
    assert_eq!(books.as_array().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_prefetch_failure_never_disturbs_foreground() {
    let cache = shared_cache();
    let service = seeded_service().await;
    service.fail_next_queries(1);
    let hinter = Arc::new(RecordingHinter::default());
    let scheduler = PrefetchScheduler::new(
        cache.clone(),
        service.clone(),
        Arc::new(ImagePreloader::new(hinter)),
    );

    // Background prefetch hits the injected failure and swallows it
    scheduler.prefetch_related("1").await.unwrap();
    assert_eq!(scheduler.stats().failed, 1);
    assert!(cache.is_empty().await);

    // Foreground path is unaffected
    let client = QueryClient::new(cache);
    let fetch = {
        let service = service.clone();
        move || {
            let service = service.clone();
            async move {
                let rows = service
                    .query(
                        QueryRequest::collection("listings").filter_eq("id", json!("1")).limit(1),
                    )
                    .await?;
                Ok(rows.into_iter().next().unwrap_or(Value::Null))
            }
        }
    };

    let listing: Option<Value> = client
        .fetch("listing:1", &QueryOptions::default(), &fetch)
        .await
        .unwrap();
    assert_eq!(listing.unwrap()["category"], json!("electronics"));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_foreground_queries_share_one_fetch() {
    let cache = shared_cache();
    let service = seeded_service().await;
    let client = QueryClient::new(cache);

    let fetches = Arc::new(AtomicUsize::new(0));
    let fetch = {
        let service = service.clone();
        let fetches = fetches.clone();
        move || {
            let service = service.clone();
            let fetches = fetches.clone();
            async move {
                fetches.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(30)).await;
                let rows = service
                    .query(
                        QueryRequest::collection("listings").filter_eq("id", json!("4")).limit(1),
                    )
                    .await?;
                Ok(rows.into_iter().next().unwrap_or(Value::Null))
            }
        }
    };

    let options = QueryOptions::default();
    let (a, b, c) = tokio::join!(
        client.fetch::<Value, _, _>("listing:4", &options, &fetch),
        client.fetch::<Value, _, _>("listing:4", &options, &fetch),
        client.fetch::<Value, _, _>("listing:4", &options, &fetch),
    );

    let a = a.unwrap().unwrap();
    assert_eq!(a, b.unwrap().unwrap());
    assert_eq!(a, c.unwrap().unwrap());
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}
