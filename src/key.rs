//! Structured cache key construction
//!
//! All components share one cache; `scope:identifier?params` keys with a
//! fixed set of scope prefixes are the collision-avoidance convention.

use crate::cache::CacheKey;
use std::fmt;

/// Scope prefix for a cache key, one per marketplace entity kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyScope {
    /// A single listing (product, service, or business)
    Listing,

    /// All listings of one category
    Category,

    /// A seller profile
    Seller,

    /// A personalized feed page
    Feed,

    /// A search result set
    Search,

    /// Custom scope
    Custom(String),
}

impl fmt::Display for KeyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyScope::Listing => write!(f, "listing"),
            KeyScope::Category => write!(f, "category"),
            KeyScope::Seller => write!(f, "seller"),
            KeyScope::Feed => write!(f, "feed"),
            KeyScope::Search => write!(f, "search"),
            KeyScope::Custom(s) => write!(f, "custom:{}", s),
        }
    }
}

/// Builder for scoped cache keys
pub struct CacheKeyBuilder {
    scope: KeyScope,
    identifier: String,
    params: Vec<(String, String)>,
}

impl CacheKeyBuilder {
    /// Create a new cache key builder
    pub fn new(scope: KeyScope) -> Self {
        Self {
            scope,
            identifier: String::new(),
            params: Vec::new(),
        }
    }

    /// Set the primary identifier
    pub fn identifier(mut self, id: impl Into<String>) -> Self {
        self.identifier = id.into();
        self
    }

    /// Add a parameter to the key
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Build the cache key
    pub fn build(self) -> CacheKey {
        let mut key = format!("{}:{}", self.scope, self.identifier);

        if !self.params.is_empty() {
            let params_str: Vec<String> = self
                .params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            key.push_str(&format!("?{}", params_str.join("&")));
        }

        key
    }
}

/// Key for a single listing
pub fn listing_key(id: &str) -> CacheKey {
    CacheKeyBuilder::new(KeyScope::Listing).identifier(id).build()
}

/// Key for a category's listing set
pub fn category_key(category: &str) -> CacheKey {
    CacheKeyBuilder::new(KeyScope::Category)
        .identifier(category)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_display() {
        assert_eq!(format!("{}", KeyScope::Listing), "listing");
        assert_eq!(format!("{}", KeyScope::Category), "category");
        assert_eq!(format!("{}", KeyScope::Feed), "feed");
        assert_eq!(
            format!("{}", KeyScope::Custom("ads".to_string())),
            "custom:ads"
        );
    }

    #[test]
    fn test_cache_key_builder() {
        let key = CacheKeyBuilder::new(KeyScope::Listing)
            .identifier("42")
            .build();
        assert_eq!(key, "listing:42");

        let key = CacheKeyBuilder::new(KeyScope::Search)
            .identifier("widgets")
            .param("region", "eu")
            .param("page", "2")
            .build();
        assert!(key.starts_with("search:widgets"));
        assert!(key.contains("region=eu"));
        assert!(key.contains("page=2"));
    }

    #[test]
    fn test_key_helpers() {
        assert_eq!(listing_key("42"), "listing:42");
        assert_eq!(category_key("electronics"), "category:electronics");
    }
}
