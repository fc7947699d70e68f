//! REST client for the telemetry backend HTTP endpoints.
//!
//! Wraps the backend API (overview metrics, container listing, alerts,
//! logs, HBT snapshots, incidents, analyzer configuration) using
//! [`reqwest`].

use std::time::Duration;

use vigil_core::{
    ContainerAlerts, ContainerLogs, ContainerSummary, HbtSnapshot, Incident, LlmConfig,
    OverviewMetrics, TimeWindow,
};

/// Request timeout applied to the shared HTTP client.
///
/// The backend defines no explicit timeout; this bounds the worst case
/// so a hung fetch cannot pin a cache entry in-flight forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Backend default page size for alerts and incidents.
pub const DEFAULT_LIMIT: u32 = 500;

/// HTTP client for a single telemetry backend.
pub struct TelemetryClient {
    client: reqwest::Client,
    api_url: String,
}

/// Errors from the telemetry REST layer.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code. The body is not
    /// parsed; only the status line is carried.
    #[error("telemetry API error ({status}): {status_text}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status.
        status_text: String,
    },
}

impl TelemetryClient {
    /// Create a new client for a telemetry backend.
    ///
    /// * `api_url` - API root, e.g. `http://host:8000/api`.
    pub fn new(api_url: impl Into<String>) -> Result<Self, TelemetryError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across backends in tests).
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    /// The configured API root.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Fetch the aggregate overview snapshot (`GET /overview`).
    pub async fn get_overview(&self) -> Result<OverviewMetrics, TelemetryError> {
        let response = self
            .client
            .get(format!("{}/overview", self.api_url))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// List all monitored containers (`GET /containers`).
    pub async fn list_containers(&self) -> Result<Vec<ContainerSummary>, TelemetryError> {
        let response = self
            .client
            .get(format!("{}/containers", self.api_url))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Fetch alerts for one container
    /// (`GET /containers/{id}/alerts?window_seconds=&limit=&offset=`).
    ///
    /// `window` is always sent, including the all-time sentinel
    /// `window_seconds=0` -- omitting it is a different request.
    pub async fn get_container_alerts(
        &self,
        id: &str,
        window: TimeWindow,
        limit: u32,
        offset: u32,
    ) -> Result<ContainerAlerts, TelemetryError> {
        let response = self
            .client
            .get(format!("{}/containers/{}/alerts", self.api_url, id))
            .query(&[
                ("window_seconds", window.as_secs()),
                ("limit", limit),
                ("offset", offset),
            ])
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Fetch raw security logs for one container
    /// (`GET /containers/{id}/logs`).
    pub async fn get_container_logs(&self, id: &str) -> Result<ContainerLogs, TelemetryError> {
        let response = self
            .client
            .get(format!("{}/containers/{}/logs", self.api_url, id))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Fetch the latest HBT snapshot for one container (`GET /hbt/{id}`).
    ///
    /// A 404 here is an expected transient state (the snapshot may not
    /// have been generated yet); it surfaces as an ordinary
    /// [`TelemetryError::Api`] and callers decide not to retry.
    pub async fn get_hbt_snapshot(&self, id: &str) -> Result<HbtSnapshot, TelemetryError> {
        let response = self
            .client
            .get(format!("{}/hbt/{}", self.api_url, id))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// List derived incidents
    /// (`GET /incidents?container_id?=&window_seconds=&limit=&offset=`).
    ///
    /// `container_id` is omitted entirely when `None` ("all containers").
    pub async fn get_incidents(
        &self,
        container_id: Option<&str>,
        window: TimeWindow,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Incident>, TelemetryError> {
        let mut params: Vec<(&str, String)> = Vec::with_capacity(4);
        if let Some(id) = container_id {
            params.push(("container_id", id.to_string()));
        }
        params.push(("window_seconds", window.as_secs().to_string()));
        params.push(("limit", limit.to_string()));
        params.push(("offset", offset.to_string()));

        let response = self
            .client
            .get(format!("{}/incidents", self.api_url))
            .query(&params)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Read the LLM analyzer configuration (`GET /config/llm`).
    pub async fn get_llm_config(&self) -> Result<LlmConfig, TelemetryError> {
        let response = self
            .client
            .get(format!("{}/config/llm", self.api_url))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Save the LLM analyzer configuration (`POST /config/llm`).
    ///
    /// Pass-through write: the backend rejects the whole save if any
    /// required field is missing, and echoes the saved config on
    /// success.
    pub async fn set_llm_config(&self, config: &LlmConfig) -> Result<LlmConfig, TelemetryError> {
        let response = self
            .client
            .post(format!("{}/config/llm", self.api_url))
            .json(config)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`TelemetryError::Api`]
    /// carrying the status line on failure. The body is deliberately
    /// not read on error.
    fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, TelemetryError> {
        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Api {
                status: status.as_u16(),
                status_text: status
                    .canonical_reason()
                    .unwrap_or("Unknown Status")
                    .to_string(),
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TelemetryError> {
        let response = Self::ensure_success(response)?;
        Ok(response.json::<T>().await?)
    }
}
