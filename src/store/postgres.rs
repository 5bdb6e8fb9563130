use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{CountQuery, CountStore, FilterValue, StoreError};

/// Counts against the service's own PostgreSQL database.
#[derive(Debug, Clone)]
pub struct PgCountStore {
    pool: PgPool,
}

impl PgCountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `SELECT COUNT(*) FROM <table> WHERE col = $1 AND ...` with bound values.
fn count_sql(query: &CountQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM ");
    builder.push(query.collection.table());

    for (i, filter) in query.filters.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        builder.push(filter.column);
        builder.push(" = ");
        match &filter.value {
            FilterValue::Bool(b) => builder.push_bind(*b),
            FilterValue::Text(t) => builder.push_bind(t.clone()),
        };
    }

    builder
}

#[async_trait]
impl CountStore for PgCountStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn count(&self, query: &CountQuery) -> Result<Option<i64>, StoreError> {
        let mut builder = count_sql(query);
        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(Some(count))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
