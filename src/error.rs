//! Error types for the caching and prefetching layer
//!
//! Cache misses and expired entries are never errors here; they are signaled
//! with `Option::None`. Errors cover the remote data service, exhausted fetch
//! retries, serialization, and configuration.

use thiserror::Error;

/// Main error type for cache and prefetch operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// Remote data service error - query, mutation, or function invocation failed
    #[error("Data service error: {0}")]
    Service(String),

    /// A foreground fetch failed after exhausting its retry budget
    #[error("Fetch failed after {attempts} attempt(s): {message}")]
    FetchFailed { attempts: u32, message: String },

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for cache and prefetch operations
pub type Result<T> = std::result::Result<T, CacheError>;

impl From<String> for CacheError {
    fn from(s: String) -> Self {
        CacheError::Other(s)
    }
}

impl From<&str> for CacheError {
    fn from(s: &str) -> Self {
        CacheError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Serialization(e.to_string())
    }
}
