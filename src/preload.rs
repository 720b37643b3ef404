//! Image preloading via runtime resource hints
//!
//! The runtime's hint surface (a browser `<link rel=preload>` equivalent)
//! sits behind the [`ResourceHinter`] trait. Preloading is synchronous,
//! bounded, and best-effort: a hinted URL that later fails to load is
//! invisible to the caller.

use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Priority tag attached to a preload hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadPriority {
    Low,
    High,
}

impl fmt::Display for PreloadPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreloadPriority::Low => write!(f, "low"),
            PreloadPriority::High => write!(f, "high"),
        }
    }
}

/// Runtime boundary for issuing a single resource hint
pub trait ResourceHinter: Send + Sync {
    /// Ask the runtime to fetch `url` ahead of use at the given priority
    fn request_preload(&self, url: &str, priority: PreloadPriority);
}

/// Default hinter: logs the hint and nothing else
///
/// Stands in wherever no real runtime hint surface is wired up.
#[derive(Debug, Default)]
pub struct TracingHinter;

impl ResourceHinter for TracingHinter {
    fn request_preload(&self, url: &str, priority: PreloadPriority) {
        debug!(%url, %priority, "Preload hint");
    }
}

/// Batch image preloader over a [`ResourceHinter`]
pub struct ImagePreloader {
    hinter: Arc<dyn ResourceHinter>,
    max_batch: usize,
}

impl ImagePreloader {
    /// Create a preloader over the given hinter
    pub fn new(hinter: Arc<dyn ResourceHinter>) -> Self {
        Self {
            hinter,
            max_batch: 16,
        }
    }

    /// Cap the number of URLs hinted per batch
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch;
        self
    }

    /// Issue preload hints for a batch of image URLs
    ///
    /// Empty URLs are skipped; batches beyond the cap are truncated. Never
    /// blocks and never fails.
    pub fn preload(&self, urls: &[String], priority: PreloadPriority) {
        let mut hinted = 0;
        for url in urls.iter().take(self.max_batch) {
            if url.is_empty() {
                continue;
            }
            self.hinter.request_preload(url, priority);
            hinted += 1;
        }

        if hinted > 0 {
            debug!(hinted, dropped = urls.len().saturating_sub(self.max_batch), %priority, "Preloaded image batch");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHinter {
        hints: Mutex<Vec<(String, PreloadPriority)>>,
    }

    impl ResourceHinter for RecordingHinter {
        fn request_preload(&self, url: &str, priority: PreloadPriority) {
            self.hints.lock().unwrap().push((url.to_string(), priority));
        }
    }

    #[test]
    fn test_preload_batch() {
        let hinter = Arc::new(RecordingHinter::default());
        let preloader = ImagePreloader::new(hinter.clone());

        preloader.preload(
            &["a.jpg".to_string(), "b.jpg".to_string()],
            PreloadPriority::Low,
        );

        let hints = hinter.hints.lock().unwrap();
        assert_eq!(hints.len(), 2);
        assert_eq!(hints[0], ("a.jpg".to_string(), PreloadPriority::Low));
    }

    #[test]
    fn test_preload_skips_empty_urls() {
        let hinter = Arc::new(RecordingHinter::default());
        let preloader = ImagePreloader::new(hinter.clone());

        preloader.preload(
            &["".to_string(), "b.jpg".to_string()],
            PreloadPriority::High,
        );

        let hints = hinter.hints.lock().unwrap();
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].0, "b.jpg");
    }

    #[test]
    fn test_preload_respects_max_batch() {
        let hinter = Arc::new(RecordingHinter::default());
        let preloader = ImagePreloader::new(hinter.clone()).with_max_batch(2);

        let urls: Vec<String> = (0..5).map(|i| format!("{}.jpg", i)).collect();
        preloader.preload(&urls, PreloadPriority::Low);

        assert_eq!(hinter.hints.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_priority_display() {
        assert_eq!(PreloadPriority::Low.to_string(), "low");
        assert_eq!(PreloadPriority::High.to_string(), "high");
    }
}
