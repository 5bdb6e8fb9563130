use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Collection, CountQuery, CountStore, FilterValue, StoreError};

type Row = HashMap<&'static str, FilterValue>;

/// In-process store holding rows as column maps. Used for local runs and tests.
#[derive(Debug, Default)]
pub struct MemoryCountStore {
    rows: RwLock<HashMap<Collection, Vec<Row>>>,
    failing: RwLock<HashSet<Collection>>,
    calls: AtomicUsize,
}

impl MemoryCountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row.
    pub async fn insert<I, V>(&self, collection: Collection, columns: I)
    where
        I: IntoIterator<Item = (&'static str, V)>,
        V: Into<FilterValue>,
    {
        let row = columns.into_iter().map(|(k, v)| (k, v.into())).collect();
        self.rows.write().await.entry(collection).or_default().push(row);
    }

    /// Append `n` copies of the same row.
    pub async fn insert_many<V>(&self, collection: Collection, n: usize, columns: &[(&'static str, V)])
    where
        V: Into<FilterValue> + Clone,
    {
        for _ in 0..n {
            self.insert(collection, columns.iter().cloned()).await;
        }
    }

    /// Make every count against `collection` fail until cleared.
    pub async fn fail_collection(&self, collection: Collection) {
        self.failing.write().await.insert(collection);
    }

    pub async fn clear_failures(&self) {
        self.failing.write().await.clear();
    }

    /// Number of `count` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CountStore for MemoryCountStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn count(&self, query: &CountQuery) -> Result<Option<i64>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.read().await.contains(&query.collection) {
            return Err(StoreError::Unavailable(format!(
                "{} is failing",
                query.collection.table()
            )));
        }

        let rows = self.rows.read().await;
        let matching = rows
            .get(&query.collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| {
                        query
                            .filters
                            .iter()
                            .all(|f| row.get(f.column) == Some(&f.value))
                    })
                    .count()
            })
            .unwrap_or(0);

        Ok(Some(matching as i64))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_matching_rows_only() {
        let store = MemoryCountStore::new();
        store
            .insert_many(Collection::Leads, 3, &[("source", "chatbot")])
            .await;
        store
            .insert_many(Collection::Leads, 2, &[("source", "form")])
            .await;

        let all = store.count(&CountQuery::all(Collection::Leads)).await.unwrap();
        let chatbot = store
            .count(&CountQuery::all(Collection::Leads).eq("source", "chatbot"))
            .await
            .unwrap();
        let empty = store
            .count(&CountQuery::all(Collection::WorkflowSteps))
            .await
            .unwrap();

        assert_eq!(all, Some(5));
        assert_eq!(chatbot, Some(3));
        assert_eq!(empty, Some(0));
        assert_eq!(store.calls(), 3);
    }

    #[tokio::test]
    async fn bool_filters_do_not_match_text() {
        let store = MemoryCountStore::new();
        store
            .insert(Collection::Profiles, [("profile_completed", true)])
            .await;
        let as_bool = store
            .count(&CountQuery::all(Collection::Profiles).eq("profile_completed", true))
            .await
            .unwrap();
        let as_text = store
            .count(&CountQuery::all(Collection::Profiles).eq("profile_completed", "true"))
            .await
            .unwrap();
        assert_eq!(as_bool, Some(1));
        assert_eq!(as_text, Some(0));
    }

    #[tokio::test]
    async fn failing_collection_errors_until_cleared() {
        let store = MemoryCountStore::new();
        store.fail_collection(Collection::Leads).await;
        assert!(store.count(&CountQuery::all(Collection::Leads)).await.is_err());
        assert!(store.count(&CountQuery::all(Collection::Profiles)).await.is_ok());

        store.clear_failures().await;
        assert!(store.count(&CountQuery::all(Collection::Leads)).await.is_ok());
    }
}
