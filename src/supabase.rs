use reqwest::{Client, header};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::errors::StoreError;

/// RowQuery
///
/// A single-row lookup: `SELECT columns FROM table WHERE column = value LIMIT 1`.
#[derive(Debug, Clone, Copy)]
pub struct RowQuery<'a> {
    pub table: &'a str,
    pub columns: &'a [&'a str],
    pub filter_column: &'a str,
    pub filter_value: &'a str,
}

impl RowQuery<'_> {
    fn query_pairs(&self) -> [(String, String); 3] {
        [
            ("select".to_string(), self.columns.join(",")),
            (self.filter_column.to_string(), format!("eq.{}", self.filter_value)),
            ("limit".to_string(), "1".to_string()),
        ]
    }
}

/// PostgrestClient
///
/// Thin client for the Supabase REST gateway. It holds no credential of its own: every
/// call names the `apikey` and bearer it runs under, which is what decides whether
/// row-level policy applies.
#[derive(Clone)]
pub struct PostgrestClient {
    http: Client,
    rest_url: String,
}

impl PostgrestClient {
    pub fn new(rest_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            rest_url: rest_url.into(),
        })
    }

    /// fetch_one
    ///
    /// Runs `query` and returns the first row, or `None` when nothing matched (or the
    /// caller's policy hides the row). Non-2xx answers and undecodable rows are errors.
    pub async fn fetch_one<T: DeserializeOwned>(
        &self,
        query: RowQuery<'_>,
        api_key: &str,
        bearer: &str,
    ) -> Result<Option<T>, StoreError> {
        let url = format!("{}/{}", self.rest_url, query.table);

        let response = self
            .http
            .get(url)
            .query(&query.query_pairs())
            .header("apikey", api_key)
            .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let rows: Vec<T> = serde_json::from_slice(&bytes)?;
        Ok(rows.into_iter().next())
    }
}
