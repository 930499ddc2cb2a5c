//! Client for the hosted relational store.
//!
//! The store exposes every table over a PostgREST-style HTTP interface:
//! `GET {url}/rest/v1/{table}?col=eq.value&order=col.asc&limit=n&offset=m`
//! for reads, `POST` for inserts and `POST` with `on_conflict` plus
//! `Prefer: resolution=merge-duplicates` for upserts.

use crate::config::Config;
use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Rows fetched per request when walking a whole table.
pub const SCAN_CHUNK_SIZE: usize = 1000;

/// A read query against one table, built from PostgREST filter parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    table: String,
    params: Vec<(String, String)>,
}

impl TableQuery {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            params: Vec::new(),
        }
    }

    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.params.push((column.to_string(), "is.null".to_string()));
        self
    }

    /// `column IN (values)`. Values are double-quoted so ids containing
    /// reserved characters survive.
    pub fn in_list<S: AsRef<str>>(mut self, column: &str, values: &[S]) -> Self {
        let quoted = values
            .iter()
            .map(|v| format!("\"{}\"", v.as_ref().replace('"', "\\\"")))
            .collect::<Vec<_>>()
            .join(",");
        self.params.push((column.to_string(), format!("in.({})", quoted)));
        self
    }

    /// Ordering clause, e.g. `display_order.asc,created_at.desc`.
    pub fn order(mut self, spec: &str) -> Self {
        self.params.push(("order".to_string(), spec.to_string()));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.params.push(("offset".to_string(), offset.to_string()));
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.store_url, &config.store_api_key)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Run a read query and decode the returned rows.
    pub async fn select<T: DeserializeOwned>(&self, query: &TableQuery) -> Result<Vec<T>, StoreError> {
        debug!("Store select on {} with {:?}", query.table(), query.params());

        let response = self
            .request(reqwest::Method::GET, query.table())
            .query(query.params())
            .send()
            .await
            .map_err(|source| StoreError::Transport {
                table: query.table().to_string(),
                source,
            })?;

        decode_rows(query.table(), response).await
    }

    /// Read every row matching `query`, walking the table in
    /// [`SCAN_CHUNK_SIZE`] pages. The query must carry a stable `order`.
    pub async fn select_all<T: DeserializeOwned>(&self, query: &TableQuery) -> Result<Vec<T>, StoreError> {
        let mut rows = Vec::new();
        let mut offset = 0;

        loop {
            let page_query = query.clone().limit(SCAN_CHUNK_SIZE).offset(offset);
            let page: Vec<T> = self.select(&page_query).await?;
            let fetched = page.len();
            rows.extend(page);

            if fetched < SCAN_CHUNK_SIZE {
                break;
            }
            offset += fetched;
        }

        Ok(rows)
    }

    /// Insert rows and return the stored representation.
    pub async fn insert<B, T>(&self, table: &str, rows: &B) -> Result<Vec<T>, StoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(reqwest::Method::POST, table)
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await
            .map_err(|source| StoreError::Transport {
                table: table.to_string(),
                source,
            })?;

        decode_rows(table, response).await
    }

    /// Insert-or-update rows in a single request, keyed on `on_conflict`
    /// (a comma-separated column list backed by a unique constraint).
    pub async fn upsert<B, T>(&self, table: &str, on_conflict: &str, rows: &B) -> Result<Vec<T>, StoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(reqwest::Method::POST, table)
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(rows)
            .send()
            .await
            .map_err(|source| StoreError::Transport {
                table: table.to_string(),
                source,
            })?;

        decode_rows(table, response).await
    }
}

async fn decode_rows<T: DeserializeOwned>(
    table: &str,
    response: reqwest::Response,
) -> Result<Vec<T>, StoreError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
        return Err(StoreError::Status {
            table: table.to_string(),
            status,
            body,
        });
    }

    response.json().await.map_err(|source| StoreError::Decode {
        table: table.to_string(),
        source,
    })
}
