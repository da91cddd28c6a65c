//! REST Table Store
//!
//! Call records kept in a PostgREST-style table API (the query dialect used
//! by hosted Postgres services).
//!
//! # Table API
//!
//! - `POST   /rest/v1/<table>` - insert, with `Prefer: return=representation`
//! - `PATCH  /rest/v1/<table>?id=eq.<id>` - update fields
//! - `GET    /rest/v1/<table>?select=*&order=start_time.desc&limit=<n>` - query
//!
//! Every request carries the project key twice: as `apikey` and as a bearer
//! token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::traits::CallStore;
use crate::call::{CallDirection, CallRecord, NewCallRecord, RecordId};
use crate::config::{ConfigError, StoreSettings};
use crate::error::StoreError;

/// Client for a REST call-record table
#[derive(Clone)]
pub struct RestStore {
    /// Service base URL (no trailing slash)
    base_url: String,
    /// Project API key
    api_key: String,
    /// Table holding call records
    table: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("base_url", &self.base_url)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl RestStore {
    /// Create a store client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        table: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            table: table.into(),
            http_client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    /// Create from loaded settings
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingStoreUrl`] or
    /// [`ConfigError::MissingStoreKey`] when credentials are absent.
    pub fn from_settings(settings: &StoreSettings) -> Result<Self, ConfigError> {
        let (url, key) = settings.credentials()?;
        Self::new(url, key, settings.table.clone(), settings.timeout)
            .map_err(|e| ConfigError::ValidationError(format!("cannot build store client: {e}")))
    }

    /// Table endpoint URL
    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// Start a request with auth headers
    fn request(&self, method: Method) -> RequestBuilder {
        self.http_client
            .request(method, self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Reject non-success responses
    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Decode a JSON body
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Query for the newest record matching a number and directions
fn latest_query(phone_number: &str, directions: &[CallDirection]) -> Vec<(&'static str, String)> {
    let directions = directions
        .iter()
        .map(CallDirection::as_str)
        .collect::<Vec<_>>()
        .join(",");
    vec![
        ("select", "*".to_string()),
        ("phone_number", format!("eq.{phone_number}")),
        ("status", format!("in.({directions})")),
        ("order", "start_time.desc".to_string()),
        ("limit", "1".to_string()),
    ]
}

/// Query for the newest `limit` records
fn recent_query(limit: usize) -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_string()),
        ("order", "start_time.desc".to_string()),
        ("limit", limit.to_string()),
    ]
}

#[async_trait]
impl CallStore for RestStore {
    fn name(&self) -> &str {
        "rest"
    }

    async fn health_check(&self) -> bool {
        self.request(Method::GET)
            .query(&[("select", "id"), ("limit", "1")])
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn insert(&self, record: NewCallRecord) -> Result<CallRecord, StoreError> {
        let response = self
            .request(Method::POST)
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await?;
        let rows: Vec<CallRecord> = Self::decode(Self::check(response).await?).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound("insert returned no rows".to_string()))
    }

    async fn update_duration(&self, id: &RecordId, duration: &str) -> Result<(), StoreError> {
        let response = self
            .request(Method::PATCH)
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{id}"))])
            .json(&serde_json::json!({ "duration": duration }))
            .send()
            .await?;
        let rows: Vec<CallRecord> = Self::decode(Self::check(response).await?).await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn latest_for_number(
        &self,
        phone_number: &str,
        directions: &[CallDirection],
    ) -> Result<Option<CallRecord>, StoreError> {
        let response = self
            .request(Method::GET)
            .query(&latest_query(phone_number, directions))
            .send()
            .await?;
        let rows: Vec<CallRecord> = Self::decode(Self::check(response).await?).await?;
        Ok(rows.into_iter().next())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<CallRecord>, StoreError> {
        let response = self
            .request(Method::GET)
            .query(&recent_query(limit))
            .send()
            .await?;
        Self::decode(Self::check(response).await?).await
    }
}
