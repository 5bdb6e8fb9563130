//! PostgREST client for hosted data stores.
//!
//! Counts are requested with `HEAD` plus `Prefer: count=exact`, so no rows
//! travel over the wire; the total comes back in `Content-Range`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};

use super::{CountQuery, CountStore, StoreError};

/// Connection settings for a PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project URL, e.g. `https://abc.supabase.co`. `/rest/v1` is appended.
    pub base_url: String,
    /// Anonymous or service API key, sent as `apikey` and bearer token.
    pub api_key: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct PostgrestCountStore {
    client: Client,
    config: PostgrestConfig,
}

impl PostgrestCountStore {
    pub fn new(config: PostgrestConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self { client, config })
    }

    fn rest_url(&self, path: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            path
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.config.api_key))
    }
}

/// Query-string pairs for a count request: `select=*` then `col=eq.value`.
fn query_pairs(query: &CountQuery) -> Vec<(String, String)> {
    let mut pairs = vec![("select".to_string(), "*".to_string())];
    pairs.extend(
        query
            .filters
            .iter()
            .map(|f| (f.column.to_string(), format!("eq.{}", f.value))),
    );
    pairs
}

/// Total from a `Content-Range` value such as `0-24/100` or `*/100`.
/// An unknown total (`*/*`) is `None`.
fn parse_content_range(value: &str) -> Result<Option<i64>, StoreError> {
    let (_, total) = value
        .rsplit_once('/')
        .ok_or_else(|| StoreError::MalformedCount(value.to_string()))?;

    match total.trim() {
        "*" => Ok(None),
        t => t
            .parse::<i64>()
            .map(Some)
            .map_err(|_| StoreError::MalformedCount(value.to_string())),
    }
}

#[async_trait]
impl CountStore for PostgrestCountStore {
    fn backend(&self) -> &'static str {
        "postgrest"
    }

    async fn count(&self, query: &CountQuery) -> Result<Option<i64>, StoreError> {
        let response = self
            .authorized(self.client.head(self.rest_url(query.collection.table())))
            .header("Prefer", "count=exact")
            .query(&query_pairs(query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        match response.headers().get(header::CONTENT_RANGE) {
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|_| StoreError::MalformedCount("non-ASCII header".to_string()))?;
                parse_content_range(value)
            }
            None => {
                tracing::debug!(
                    table = query.collection.table(),
                    "Count response carried no Content-Range"
                );
                Ok(None)
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let response = self.authorized(self.client.get(self.rest_url(""))).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Unavailable(format!(
                "PostgREST answered {}",
                response.status()
            )))
        }
    }
}
