//! Navigation pattern tracking and next-page prediction
//!
//! Records `(from, to)` page transitions with counts and recency, bounded to
//! a fixed capacity, and predicts the most likely next destinations for a
//! page. Predictions feed the prefetch scheduler; an empty prediction is a
//! normal outcome, never an error.

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Maximum number of destinations a prediction returns
const MAX_PREDICTIONS: usize = 3;

/// One observed page transition
#[derive(Debug, Clone)]
pub struct NavigationPattern {
    /// Origin path
    pub from: String,

    /// Destination path
    pub to: String,

    /// How many times this transition was observed
    pub count: u64,

    /// When the transition was last observed
    pub last_seen: Instant,
}

/// Configuration for the navigation tracker
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Maximum number of distinct patterns retained
    pub capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}

impl TrackerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Bounded tracker of page-transition patterns
///
/// Patterns are kept in insertion order; `predict` sorts stably by count, so
/// equal-count destinations tie-break by which was first observed.
pub struct NavigationTracker {
    config: TrackerConfig,
    patterns: RwLock<Vec<NavigationPattern>>,
}

impl NavigationTracker {
    /// Create a tracker with the default capacity
    pub fn new() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    /// Create a tracker with a custom configuration
    pub fn with_config(config: TrackerConfig) -> Self {
        Self {
            config,
            patterns: RwLock::new(Vec::new()),
        }
    }

    /// Record a page transition
    ///
    /// Self-transitions are ignored. At capacity, the single globally
    /// oldest-by-recency pattern is evicted to make room.
    pub async fn track(&self, from: &str, to: &str) {
        if from == to {
            return;
        }

        let mut patterns = self.patterns.write().await;

        if let Some(pattern) = patterns
            .iter_mut()
            .find(|p| p.from == from && p.to == to)
        {
            pattern.count += 1;
            pattern.last_seen = Instant::now();
            debug!(%from, %to, count = pattern.count, "Refreshed navigation pattern");
            return;
        }

        if patterns.len() >= self.config.capacity {
            if let Some(oldest) = patterns
                .iter()
                .enumerate()
                .min_by_key(|(_, p)| p.last_seen)
                .map(|(i, _)| i)
            {
                let evicted = patterns.remove(oldest);
                debug!(
                    from = %evicted.from,
                    to = %evicted.to,
                    "Evicted oldest navigation pattern"
                );
            }
        }

        patterns.push(NavigationPattern {
            from: from.to_string(),
            to: to.to_string(),
            count: 1,
            last_seen: Instant::now(),
        });
        debug!(%from, %to, "Recorded navigation pattern");
    }

    /// Predict likely next destinations from a page
    ///
    /// Destinations ordered by descending count, at most
    /// [`MAX_PREDICTIONS`]; empty when nothing matches.
    pub async fn predict(&self, from: &str) -> Vec<String> {
        let patterns = self.patterns.read().await;

        let mut matching: Vec<&NavigationPattern> =
            patterns.iter().filter(|p| p.from == from).collect();
        matching.sort_by(|a, b| b.count.cmp(&a.count));

        matching
            .into_iter()
            .take(MAX_PREDICTIONS)
            .map(|p| p.to.clone())
            .collect()
    }

    /// Number of patterns currently retained
    pub async fn len(&self) -> usize {
        self.patterns.read().await.len()
    }

    /// Check if no patterns have been recorded
    pub async fn is_empty(&self) -> bool {
        self.patterns.read().await.is_empty()
    }

    /// Observed count for a specific transition
    pub async fn count(&self, from: &str, to: &str) -> u64 {
        self.patterns
            .read()
            .await
            .iter()
            .find(|p| p.from == from && p.to == to)
            .map(|p| p.count)
            .unwrap_or(0)
    }
}

impl Default for NavigationTracker {
    fn default() -> Self {
        Self::new()
    }
}
