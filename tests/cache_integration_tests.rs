//! Integration tests for the shared cache
//!
//! These tests verify the complete cache contract on the paused tokio
//! clock:
//! - Basic operations and overwrite semantics
//! - TTL expiration with lazy eviction
//! - Capacity eviction
//! - The background sweep task

use bazaar_cache::{start_auto_cleanup, CacheConfig, SharedCache};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::advance;

fn cache_with(max_entries: usize) -> SharedCache {
    let config = CacheConfig::builder()
        .default_ttl(Duration::from_secs(60))
        .ttl_jitter(0.0)
        .max_entries(max_entries)
        .build();
    SharedCache::new(config)
}

#[tokio::test(start_paused = true)]
async fn test_basic_cache_operations() {
    let cache = cache_with(100);

    cache
        .insert_with_ttl(
            "listing:1".to_string(),
            json!({"id": "1"}),
            Duration::from_secs(5),
        )
        .await;

    assert_eq!(cache.get("listing:1").await, Some(json!({"id": "1"})));
    assert!(cache.contains("listing:1").await);

    let stats = cache.stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 0);
    assert_eq!(stats.entries, 1);
}

#[tokio::test(start_paused = true)]
async fn test_set_then_get_round_trip_and_expiry() {
    let cache = cache_with(100);

    cache
        .insert_with_ttl(
            "product:42".to_string(),
            json!({"id": 42, "name": "Widget"}),
            Duration::from_millis(5000),
        )
        .await;

    assert_eq!(
        cache.get("product:42").await,
        Some(json!({"id": 42, "name": "Widget"}))
    );

    advance(Duration::from_millis(5001)).await;

    assert_eq!(cache.get("product:42").await, None);
    assert!(!cache.contains("product:42").await);
    // The expired read also released the storage
    assert_eq!(cache.len().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_overwrite_replaces_value_and_expiry() {
    let cache = cache_with(100);

    cache
        .insert_with_ttl("k".to_string(), json!("old"), Duration::from_secs(1))
        .await;
    cache
        .insert_with_ttl("k".to_string(), json!("new"), Duration::from_secs(10))
        .await;

    advance(Duration::from_secs(5)).await;

    // Survives the old expiry because the re-set replaced it wholesale
    assert_eq!(cache.get("k").await, Some(json!("new")));
    assert_eq!(cache.len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_idempotent_double_set() {
    let cache = cache_with(100);

    cache
        .insert_with_ttl("k".to_string(), json!(1), Duration::from_secs(5))
        .await;
    cache
        .insert_with_ttl("k".to_string(), json!(1), Duration::from_secs(5))
        .await;

    assert_eq!(cache.len().await, 1);
    assert_eq!(cache.get("k").await, Some(json!(1)));

    advance(Duration::from_millis(5001)).await;
    assert_eq!(cache.get("k").await, None);
}

#[tokio::test(start_paused = true)]
async fn test_capacity_eviction() {
    let cache = cache_with(3);

    cache.insert("k1".to_string(), json!(1)).await;
    cache.insert("k2".to_string(), json!(2)).await;
    cache.insert("k3".to_string(), json!(3)).await;

    // Touch k1 and k3 so k2 is the least recently used
    cache.get("k1").await;
    cache.get("k3").await;

    cache.insert("k4".to_string(), json!(4)).await;

    assert_eq!(cache.len().await, 3);
    assert_eq!(cache.get("k2").await, None);
    assert!(cache.get("k1").await.is_some());
    assert!(cache.get("k3").await.is_some());
    assert!(cache.get("k4").await.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_background_sweep_clears_unread_entries() {
    let config = CacheConfig::builder()
        .default_ttl(Duration::from_millis(100))
        .ttl_jitter(0.0)
        .cleanup_interval(Duration::from_millis(200))
        .build();
    let cache = Arc::new(SharedCache::new(config));

    cache.insert("k1".to_string(), json!(1)).await;
    cache.insert("k2".to_string(), json!(2)).await;

    let sweeper = tokio::spawn(start_auto_cleanup(cache.clone()));

    advance(Duration::from_millis(250)).await;
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }

    // Entries expired and were swept without ever being read
    assert_eq!(cache.len().await, 0);
    let stats = cache.stats().await;
    assert_eq!(stats.evictions_ttl, 2);

    sweeper.abort();
}

#[tokio::test(start_paused = true)]
async fn test_stats_track_hits_misses_and_rates() {
    let cache = cache_with(100);

    cache.insert("k1".to_string(), json!(1)).await;
    cache.get("k1").await;
    cache.get("k1").await;
    cache.get("missing").await;

    let stats = cache.stats().await;
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert!((stats.hit_rate() - 66.66).abs() < 1.0);
}
