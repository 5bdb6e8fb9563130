//! Remote data store: count-only queries over the dashboard's collections.
//!
//! The dashboard never reads rows, it only asks "how many rows of this
//! collection match these equality filters". [`CountStore`] is that single
//! capability; backends decide how the question reaches the data.

mod memory;
mod postgres;
mod postgrest;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

pub use memory::MemoryCountStore;
pub use postgres::PgCountStore;
pub use postgrest::{PostgrestConfig, PostgrestCountStore};

use crate::config::StatsBackend;

/// Collections the dashboard counts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Profiles,
    Leads,
    WorkflowSteps,
}

impl Collection {
    pub fn table(self) -> &'static str {
        match self {
            Collection::Profiles => "profiles",
            Collection::Leads => "leads",
            Collection::WorkflowSteps => "workflow_steps",
        }
    }
}

/// Right-hand side of an equality filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterValue {
    Bool(bool),
    Text(String),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Bool(b) => write!(f, "{b}"),
            FilterValue::Text(t) => f.write_str(t),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

/// `column = value`. Column names come from code, never from request input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Filter {
    pub column: &'static str,
    pub value: FilterValue,
}

/// Count rows of one collection matching every filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CountQuery {
    pub collection: Collection,
    pub filters: Vec<Filter>,
}

impl CountQuery {
    /// Count every row of the collection.
    pub fn all(collection: Collection) -> Self {
        Self {
            collection,
            filters: Vec::new(),
        }
    }

    /// Add an equality filter.
    pub fn eq(mut self, column: &'static str, value: impl Into<FilterValue>) -> Self {
        self.filters.push(Filter {
            column,
            value: value.into(),
        });
        self
    }
}

/// Failure talking to the data store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("Malformed count header: {0}")]
    MalformedCount(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Count-only query capability over the dashboard's collections.
#[async_trait]
pub trait CountStore: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;

    /// Number of matching rows. `Ok(None)` means the backend answered without
    /// a count.
    async fn count(&self, query: &CountQuery) -> Result<Option<i64>, StoreError>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Build the configured store. The Postgres backend shares the service pool.
pub fn from_backend(
    backend: &StatsBackend,
    pool: &PgPool,
    request_timeout_ms: u64,
) -> Result<Arc<dyn CountStore>, StoreError> {
    let store: Arc<dyn CountStore> = match backend {
        StatsBackend::Postgres => Arc::new(PgCountStore::new(pool.clone())),
        StatsBackend::Postgrest { url, api_key } => {
            Arc::new(PostgrestCountStore::new(PostgrestConfig {
                base_url: url.clone(),
                api_key: api_key.clone(),
                request_timeout_ms,
            })?)
        }
    };
    tracing::info!(backend = store.backend(), "Statistics store configured");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_filters_in_order() {
        let query = CountQuery::all(Collection::Leads)
            .eq("source", "chatbot")
            .eq("archived", false);
        assert_eq!(query.collection.table(), "leads");
        assert_eq!(query.filters.len(), 2);
        assert_eq!(query.filters[0].column, "source");
        assert_eq!(query.filters[0].value, FilterValue::Text("chatbot".to_string()));
        assert_eq!(query.filters[1].value, FilterValue::Bool(false));
    }

    #[test]
    fn filter_value_display() {
        assert_eq!(FilterValue::Bool(true).to_string(), "true");
        assert_eq!(FilterValue::from("pending").to_string(), "pending");
    }
}
