//! REST client for the managed Postgres backend.
//!
//! Speaks the backend's PostgREST conventions: table endpoints under
//! `/rest/v1`, `column=eq.value` filters, `Prefer: return=representation`
//! on writes. Authentication uses the service role key on every request.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::retry::{with_retry, RetryConfig};

// =============================================================================
// Configuration
// =============================================================================

/// Record store client configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Project base URL (without the /rest/v1 suffix)
    pub base_url: String,
    /// Service role key used for server-side access
    pub service_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration for idempotent reads
    pub retry: RetryConfig,
}

impl StoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        let base_url = std::env::var("SUPABASE_URL")
            .map_err(|_| StoreError::auth_error("SUPABASE_URL must be set"))?;
        let service_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| StoreError::auth_error("SUPABASE_SERVICE_ROLE_KEY must be set"))?;

        if base_url.is_empty() || service_key.is_empty() {
            return Err(StoreError::auth_error(
                "SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY cannot be empty",
            ));
        }

        let connect_timeout_secs: u64 = std::env::var("STORE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            base_url,
            service_key,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            retry: RetryConfig::from_env(),
        })
    }
}

// =============================================================================
// Client
// =============================================================================

/// Record store REST client.
#[derive(Clone)]
pub struct StoreClient {
    http: Client,
    config: StoreConfig,
    rest_url: String,
}

impl StoreClient {
    /// Create a new record store client.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("ugc-store/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StoreError::Network)?;

        let rest_url = format!("{}/rest/v1", config.base_url.trim_end_matches('/'));

        Ok(Self {
            http,
            config,
            rest_url,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        Self::new(StoreConfig::from_env()?)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
    }

    // =========================================================================
    // Table Operations
    // =========================================================================

    /// Select rows matching `column=eq.value` filters. Retried on transient
    /// failures since GETs are idempotent.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        let url = self.table_url(table);
        debug!(table, "Selecting rows");

        with_retry(&self.config.retry, "select", || async {
            let mut request = self.authed(self.http.get(&url)).query(&[("select", "*")]);
            for (column, value) in filters {
                request = request.query(&[(*column, format!("eq.{}", value))]);
            }

            let response = request.send().await?;
            let response = Self::check_status(table, response).await?;

            let rows: Vec<T> = response.json().await?;
            Ok(rows)
        })
        .await
    }

    /// Count rows matching the filters without fetching them.
    pub async fn count(&self, table: &str, filters: &[(&str, String)]) -> StoreResult<u64> {
        let url = self.table_url(table);

        with_retry(&self.config.retry, "count", || async {
            let mut request = self
                .authed(self.http.get(&url))
                .query(&[("select", "id")])
                .header("Prefer", "count=exact")
                .header("Range", "0-0");
            for (column, value) in filters {
                request = request.query(&[(*column, format!("eq.{}", value))]);
            }

            let response = request.send().await?;
            let response = Self::check_status(table, response).await?;

            // Content-Range: 0-0/42
            let total = response
                .headers()
                .get("content-range")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.rsplit('/').next())
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| StoreError::invalid_response("missing Content-Range header"))?;
            Ok(total)
        })
        .await
    }

    /// Insert a row, returning the stored representation. Never retried.
    pub async fn insert<T: DeserializeOwned, B: Serialize>(
        &self,
        table: &str,
        body: &B,
    ) -> StoreResult<T> {
        let url = self.table_url(table);
        debug!(table, "Inserting row");

        let response = self
            .authed(self.http.post(&url))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let response = Self::check_status(table, response).await?;

        let mut rows: Vec<T> = response.json().await?;
        rows.pop()
            .ok_or_else(|| StoreError::invalid_response("insert returned no representation"))
    }

    /// Patch rows matching the filters with a partial body. Never retried.
    pub async fn update<B: Serialize>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        body: &B,
    ) -> StoreResult<()> {
        let url = self.table_url(table);
        debug!(table, "Updating rows");

        let mut request = self.authed(self.http.patch(&url)).json(body);
        for (column, value) in filters {
            request = request.query(&[(*column, format!("eq.{}", value))]);
        }

        let response = request.send().await?;
        Self::check_status(table, response).await?;
        Ok(())
    }

    async fn check_status(table: &str, response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED => {
                let body = response.text().await.unwrap_or_default();
                Err(StoreError::auth_error(format!("{}: {}", table, body)))
            }
            StatusCode::FORBIDDEN => {
                let body = response.text().await.unwrap_or_default();
                Err(StoreError::PermissionDenied(format!("{}: {}", table, body)))
            }
            StatusCode::NOT_FOUND => Err(StoreError::not_found(table.to_string())),
            StatusCode::CONFLICT => Err(StoreError::AlreadyExists(table.to_string())),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_ms = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(|secs| secs * 1000)
                    .unwrap_or(1000);
                Err(StoreError::RateLimited(retry_after_ms))
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(StoreError::request_failed(format!(
                    "HTTP {} from {}: {}",
                    status.as_u16(),
                    table,
                    body
                )))
            }
        }
    }
}
