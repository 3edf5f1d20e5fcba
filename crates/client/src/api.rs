//! REST client for the remote analysis and storage service.
//!
//! Wraps the service's HTTP API (frame analysis, alert history,
//! monitoring status) using [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use vigil_core::alert::Alert;
use vigil_core::analysis::AnalysisResult;
use vigil_core::status::SystemStatus;

use crate::backend::MonitorBackend;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for one analysis service.
#[derive(Debug, Clone)]
pub struct MonitorApi {
    client: reqwest::Client,
    api_url: String,
}

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum MonitorApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, body decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Monitor API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    image: &'a str,
}

impl MonitorApi {
    /// Create a client for a service.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:5000`. A trailing
    ///   slash is ignored.
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, MonitorApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Submit an encoded snapshot for analysis.
    ///
    /// Sends `POST /api/analyze` with `{"image": <data url>}`.
    pub async fn analyze(&self, image: &str) -> Result<AnalysisResult, MonitorApiError> {
        let response = self
            .client
            .post(self.url("/api/analyze"))
            .json(&AnalyzeRequest { image })
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch up to `limit` most recent alerts, oldest first.
    ///
    /// Sends `GET /api/alerts?limit={limit}`. Rows that fail to decode
    /// are logged and skipped; the rest of the page is kept.
    pub async fn list_alerts(&self, limit: usize) -> Result<Vec<Alert>, MonitorApiError> {
        let response = self
            .client
            .get(self.url("/api/alerts"))
            .query(&[("limit", limit)])
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = Self::parse_response(response).await?;
        Ok(rows.into_iter().filter_map(decode_alert).collect())
    }

    /// Delete the service's alert history.
    ///
    /// Sends `POST /api/alerts/clear`.
    pub async fn clear_alerts(&self) -> Result<(), MonitorApiError> {
        let response = self
            .client
            .post(self.url("/api/alerts/clear"))
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Read the service's monitoring flag.
    ///
    /// Sends `GET /api/status`.
    pub async fn status(&self) -> Result<SystemStatus, MonitorApiError> {
        let response = self.client.get(self.url("/api/status")).send().await?;

        Self::parse_response(response).await
    }

    /// Tell the service monitoring was switched on or off.
    ///
    /// Sends `POST /api/status/toggle` carrying the requested state.
    pub async fn toggle_status(&self, monitoring_active: bool) -> Result<(), MonitorApiError> {
        let response = self
            .client
            .post(self.url("/api/status/toggle"))
            .json(&SystemStatus { monitoring_active })
            .send()
            .await?;

        Self::check_status(response).await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`MonitorApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, MonitorApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(MonitorApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, MonitorApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), MonitorApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

fn decode_alert(row: serde_json::Value) -> Option<Alert> {
    match serde_json::from_value(row) {
        Ok(alert) => Some(alert),
        Err(e) => {
            tracing::warn!(error = %e, "Skipping malformed alert");
            None
        }
    }
}

#[async_trait]
impl MonitorBackend for MonitorApi {
    async fn analyze(&self, image: &str) -> Result<AnalysisResult, MonitorApiError> {
        MonitorApi::analyze(self, image).await
    }

    async fn list_alerts(&self, limit: usize) -> Result<Vec<Alert>, MonitorApiError> {
        MonitorApi::list_alerts(self, limit).await
    }

    async fn clear_alerts(&self) -> Result<(), MonitorApiError> {
        MonitorApi::clear_alerts(self).await
    }

    async fn status(&self) -> Result<SystemStatus, MonitorApiError> {
        MonitorApi::status(self).await
    }

    async fn toggle_status(&self, monitoring_active: bool) -> Result<(), MonitorApiError> {
        MonitorApi::toggle_status(self, monitoring_active).await
    }
}
