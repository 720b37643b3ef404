//! In-process data service backed by seeded collections
//!
//! Evaluates filters, ordering, and limits over in-memory rows. Serves as
//! the test double for every test and doc example in this crate; `invoke`
//! answers from registered canned responses, and queries can be made to
//! fail on demand to exercise error paths.

use crate::error::{CacheError, Result};
use crate::service::{DataService, Filter, QueryRequest};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory [`DataService`] implementation
#[derive(Default)]
pub struct MemoryDataService {
    collections: RwLock<HashMap<String, Vec<Value>>>,
    functions: RwLock<HashMap<String, Value>>,
    failing_queries: AtomicU32,
}

impl MemoryDataService {
    /// Create an empty service
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection with rows
    pub async fn seed(&self, collection: impl Into<String>, rows: Vec<Value>) {
        self.collections.write().await.insert(collection.into(), rows);
    }

    /// Register a canned response for a named function
    pub async fn register_function(&self, name: impl Into<String>, response: Value) {
        self.functions.write().await.insert(name.into(), response);
    }

    /// Make the next `count` queries fail with a service error
    pub fn fail_next_queries(&self, count: u32) {
        self.failing_queries.store(count, AtomicOrdering::SeqCst);
    }

    fn take_failure(&self) -> bool {
        self.failing_queries
            .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |n| {
                if n > 0 {
                    Some(n - 1)
                } else {
                    None
                }
            })
            .is_ok()
    }
}

#[async_trait]
impl DataService for MemoryDataService {
    async fn query(&self, request: QueryRequest) -> Result<Vec<Value>> {
        if self.take_failure() {
            return Err(CacheError::Service("injected query failure".to_string()));
        }

        let collections = self.collections.read().await;
        let rows = collections
            .get(&request.collection)
            .cloned()
            .unwrap_or_default();

        let mut matched: Vec<Value> = rows
            .into_iter()
            .filter(|row| request.filters.iter().all(|f| f.matches(row)))
            .collect();

        if let Some(order) = &request.order {
            matched.sort_by(|a, b| {
                let ord = super::compare_values(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                )
                .unwrap_or(std::cmp::Ordering::Equal);
                if order.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        if let Some(limit) = request.limit {
            matched.truncate(limit);
        }

        debug!(
            collection = %request.collection,
            rows = matched.len(),
            "Memory service query"
        );
        Ok(matched)
    }

    async fn insert(&self, collection: &str, payload: Value) -> Result<Value> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(payload.clone());
        Ok(payload)
    }

    async fn update(&self, collection: &str, filters: Vec<Filter>, payload: Value) -> Result<u64> {
        let Some(patch) = payload.as_object() else {
            return Err(CacheError::Service(
                "update payload must be an object".to_string(),
            ));
        };

        let mut collections = self.collections.write().await;
        let rows = collections.entry(collection.to_string()).or_default();

        let mut affected = 0;
        for row in rows.iter_mut() {
            if filters.iter().all(|f| f.matches(row)) {
                if let Some(obj) = row.as_object_mut() {
                    for (k, v) in patch {
                        obj.insert(k.clone(), v.clone());
                    }
                    affected += 1;
                }
            }
        }
        Ok(affected)
    }

    async fn delete(&self, collection: &str, filters: Vec<Filter>) -> Result<u64> {
        let mut collections = self.collections.write().await;
        let rows = collections.entry(collection.to_string()).or_default();

        let before = rows.len();
        rows.retain(|row| !filters.iter().all(|f| f.matches(row)));
        Ok((before - rows.len()) as u64)
    }

    async fn invoke(&self, function: &str, _payload: Value) -> Result<Value> {
        let functions = self.functions.read().await;
        functions
            .get(function)
            .cloned()
            .ok_or_else(|| CacheError::Service(format!("unknown function: {}", function)))
    }
}
