//! Configuration for the cache system

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the shared TTL cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default time-to-live for entries inserted without an explicit TTL
    pub default_ttl: Duration,

    /// Maximum number of entries in the cache
    /// Prevents unbounded memory growth in a long-lived client session
    pub max_entries: usize,

    /// TTL jitter factor (0.0 - 1.0) applied to the default TTL
    /// Spreads expiry of entries inserted together; never applied to
    /// explicit per-insert TTLs
    pub ttl_jitter: f64,

    /// Enable the background sweep of expired entries
    pub enable_auto_cleanup: bool,

    /// Interval between background sweep passes
    pub cleanup_interval: Duration,

    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            // 5 minutes, the freshness window the query layer assumes
            default_ttl: Duration::from_secs(300),
            max_entries: 1_000,
            ttl_jitter: 0.10,
            enable_auto_cleanup: true,
            // Sweep every minute
            cleanup_interval: Duration::from_secs(60),
            enable_metrics: true,
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_entries == 0 {
            return Err("max_entries must be greater than 0".to_string());
        }

        if self.default_ttl.is_zero() {
            return Err("default_ttl must be greater than 0".to_string());
        }

        if !(0.0..=1.0).contains(&self.ttl_jitter) {
            return Err("ttl_jitter must be between 0.0 and 1.0".to_string());
        }

        Ok(())
    }

    /// Calculate the default TTL with jitter applied
    pub fn ttl_with_jitter(&self) -> Duration {
        if self.ttl_jitter == 0.0 {
            return self.default_ttl;
        }

        let base_secs = self.default_ttl.as_secs_f64();
        let jitter_range = base_secs * self.ttl_jitter;
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_range;
        let final_secs = (base_secs + jitter).max(1.0);

        Duration::from_secs_f64(final_secs)
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    default_ttl: Option<Duration>,
    max_entries: Option<usize>,
    ttl_jitter: Option<f64>,
    enable_auto_cleanup: Option<bool>,
    cleanup_interval: Option<Duration>,
    enable_metrics: Option<bool>,
}

impl CacheConfigBuilder {
    /// Set the default TTL for entries without an explicit TTL
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Set the maximum number of cache entries
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    /// Set the TTL jitter factor (0.0 - 1.0)
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = Some(jitter);
        self
    }

    /// Enable or disable the background sweep
    pub fn enable_auto_cleanup(mut self, enable: bool) -> Self {
        self.enable_auto_cleanup = Some(enable);
        self
    }

    /// Set the background sweep interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Enable or disable metrics collection
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = Some(enable);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            default_ttl: self.default_ttl.unwrap_or(defaults.default_ttl),
            max_entries: self.max_entries.unwrap_or(defaults.max_entries),
            ttl_jitter: self.ttl_jitter.unwrap_or(defaults.ttl_jitter),
            enable_auto_cleanup: self
                .enable_auto_cleanup
                .unwrap_or(defaults.enable_auto_cleanup),
            cleanup_interval: self.cleanup_interval.unwrap_or(defaults.cleanup_interval),
            enable_metrics: self.enable_metrics.unwrap_or(defaults.enable_metrics),
        }
    }
}

/// Preset configurations for common workloads
impl CacheConfig {
    /// Configuration for rapidly changing data (feeds, ad slots)
    pub fn volatile() -> Self {
        Self {
            default_ttl: Duration::from_secs(30),
            max_entries: 500,
            ttl_jitter: 0.15,
            ..Default::default()
        }
    }

    /// Configuration for browse-pattern data (listings, search results)
    pub fn browsing() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
            max_entries: 2_000,
            ttl_jitter: 0.10,
            ..Default::default()
        }
    }

    /// Configuration for slow-moving reference data (categories, seller profiles)
    pub fn static_content() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
            max_entries: 5_000,
            ttl_jitter: 0.05,
            ..Default::default()
        }
    }

    /// Configuration for memory-constrained clients
    pub fn small() -> Self {
        Self {
            default_ttl: Duration::from_secs(120),
            max_entries: 100,
            ttl_jitter: 0.15,
            ..Default::default()
        }
    }
}
