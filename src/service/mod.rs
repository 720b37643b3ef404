//! Remote data service boundary
//!
//! The hosted backend (database, auth, storage, serverless functions) is an
//! external collaborator. This layer consumes it through the [`DataService`]
//! trait: collection queries with filters/ordering/limit, row mutations, and
//! named function invocation, all over `serde_json::Value` rows.
//! Authentication, schema, and transport belong to the implementor.

pub mod memory;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

pub use memory::MemoryDataService;

/// Comparison operator for a query filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// A single column filter
#[derive(Debug, Clone)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: FilterOp, value: Value) -> Self {
        Self {
            column: column.into(),
            op,
            value,
        }
    }

    /// Check whether a row satisfies this filter
    pub fn matches(&self, row: &Value) -> bool {
        let Some(field) = row.get(&self.column) else {
            return false;
        };

        match self.op {
            FilterOp::Eq => field == &self.value,
            FilterOp::Ne => field != &self.value,
            FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
                let Some(ord) = compare_values(field, &self.value) else {
                    return false;
                };
                match self.op {
                    FilterOp::Gt => ord == std::cmp::Ordering::Greater,
                    FilterOp::Gte => ord != std::cmp::Ordering::Less,
                    FilterOp::Lt => ord == std::cmp::Ordering::Less,
                    FilterOp::Lte => ord != std::cmp::Ordering::Greater,
                    _ => unreachable!(),
                }
            }
        }
    }
}

/// Result ordering by a single column
#[derive(Debug, Clone)]
pub struct Ordering {
    pub column: String,
    pub descending: bool,
}

/// A collection query: filters, ordering, and a row limit
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order: Option<Ordering>,
    pub limit: Option<usize>,
}

impl QueryRequest {
    /// Start a query against a collection
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Add a filter
    pub fn filter(mut self, column: impl Into<String>, op: FilterOp, value: Value) -> Self {
        self.filters.push(Filter::new(column, op, value));
        self
    }

    /// Add an equality filter
    pub fn filter_eq(self, column: impl Into<String>, value: Value) -> Self {
        self.filter(column, FilterOp::Eq, value)
    }

    /// Add an inequality filter
    pub fn filter_ne(self, column: impl Into<String>, value: Value) -> Self {
        self.filter(column, FilterOp::Ne, value)
    }

    /// Order descending by a column
    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order = Some(Ordering {
            column: column.into(),
            descending: true,
        });
        self
    }

    /// Order ascending by a column
    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order = Some(Ordering {
            column: column.into(),
            descending: false,
        });
        self
    }

    /// Limit the number of returned rows
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Abstract capability of the hosted backend
#[async_trait]
pub trait DataService: Send + Sync {
    /// Query rows from a collection
    async fn query(&self, request: QueryRequest) -> Result<Vec<Value>>;

    /// Insert a row into a collection, returning the stored row
    async fn insert(&self, collection: &str, payload: Value) -> Result<Value>;

    /// Update rows matching the filters, returning the affected count
    async fn update(&self, collection: &str, filters: Vec<Filter>, payload: Value) -> Result<u64>;

    /// Delete rows matching the filters, returning the affected count
    async fn delete(&self, collection: &str, filters: Vec<Filter>) -> Result<u64>;

    /// Invoke a named serverless function
    async fn invoke(&self, function: &str, payload: Value) -> Result<Value>;
}

/// Total-order comparison over JSON scalars, numbers first then strings
fn compare_values(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    if let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
        return a.partial_cmp(&b);
    }
    if let (Some(a), Some(b)) = (a.as_str(), b.as_str()) {
        return Some(a.cmp(b));
    }
    None
}
