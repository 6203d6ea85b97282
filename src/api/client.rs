use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;
use uuid::Uuid;

use super::http::send_with_retry;
use super::types::{ApiError, ValidationResult};

/// Default request timeout in seconds
pub(super) const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Timeout for the reachability check (short, runs during bootstrap)
const VALIDATION_TIMEOUT_SECS: u64 = 5;

/// Connect timeout for long-lived streams
const STREAM_CONNECT_TIMEOUT_SECS: u64 = 10;

const DEFAULT_VERSION: &str = env!("CARGO_PKG_VERSION");

fn build_user_agent() -> String {
    std::env::var("ASSETDESK_USER_AGENT")
        .unwrap_or_else(|_| format!("assetdesk/{}", DEFAULT_VERSION))
}

/// Low-level HTTP client for the asset backend.
///
/// Stateless with respect to the backend location: every call takes the
/// base URL. `ApiStore` binds a validated base URL on top of this.
pub struct ApiClient {
    client: Client,
    stream_client: Client,
    user_agent: String,
    session_id: String,
}

impl ApiClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        // Streams stay open indefinitely; only the connect phase is bounded.
        let stream_client = Client::builder()
            .connect_timeout(Duration::from_secs(STREAM_CONNECT_TIMEOUT_SECS))
            .build()
            .context("Failed to build streaming HTTP client")?;

        Ok(Self {
            client,
            stream_client,
            user_agent: build_user_agent(),
            session_id: Uuid::new_v4().to_string(),
        })
    }

    /// Build `<base>/<segments...>`, percent-encoding each segment.
    pub fn endpoint(base_url: &Url, segments: &[&str]) -> Result<Url> {
        let mut url = base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("URL cannot be used as an API base: {}", base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request with the standard headers and retry policy.
    pub(super) async fn send(
        &self,
        method: Method,
        url: &Url,
        timeout: Duration,
    ) -> Result<reqwest::Response> {
        let request_id = Uuid::new_v4().to_string();

        debug!("=== API Request ===");
        debug!("{} {}", method, url);

        send_with_retry(|| {
            self.client
                .request(method.clone(), url.clone())
                .timeout(timeout)
                .header("User-Agent", &self.user_agent)
                .header("x-request-id", &request_id)
                .header("x-request-session-id", &self.session_id)
        })
        .await
        .with_context(|| format!("Failed to send request to {}", url))
    }

    /// Turn a non-success response into an `ApiError`.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        debug!("=== API Response ===");
        debug!("Status: {}", status);

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let api_error = ApiError::from_http_response(status.as_u16(), &body);
        error!(
            "API request failed ({}, HTTP {}): {}",
            api_error.status, api_error.http_status, api_error.message
        );
        Err(api_error.into())
    }

    pub async fn get_json<R>(&self, url: &Url) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let response = self
            .send(Method::GET, url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .await?;
        let response = Self::check_status(response).await?;

        let text = response
            .text()
            .await
            .context("Failed to read response body")?;
        serde_json::from_str(&text).context("Failed to parse API response")
    }

    pub async fn delete(&self, url: &Url) -> Result<()> {
        let response = self
            .send(Method::DELETE, url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Open a long-lived streaming GET.
    pub async fn open_stream(&self, url: &Url) -> Result<reqwest::Response> {
        let response = self
            .stream_client
            .get(url.clone())
            .header("User-Agent", &self.user_agent)
            .header("x-request-session-id", &self.session_id)
            .header("Accept", "application/x-ndjson")
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;
        Self::check_status(response).await
    }

    /// Quick reachability check against the `api/ping` endpoint.
    pub async fn validate_connection(&self, base_url: &Url) -> ValidationResult {
        debug!("Validating connection to {}", base_url);

        let url = match Self::endpoint(base_url, &["api", "ping"]) {
            Ok(url) => url,
            Err(e) => return ValidationResult::InvalidUrl(e.to_string()),
        };

        match self
            .send(
                Method::GET,
                &url,
                Duration::from_secs(VALIDATION_TIMEOUT_SECS),
            )
            .await
        {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    ValidationResult::Ok
                } else if status.is_server_error() {
                    ValidationResult::ServerError(format!("Server error (HTTP {})", status.as_u16()))
                } else {
                    ValidationResult::UnexpectedStatus(format!(
                        "Unexpected response (HTTP {})",
                        status.as_u16()
                    ))
                }
            }
            Err(e) => ValidationResult::ConnectionError(format!(
                "Cannot connect to {}: {:#}",
                base_url, e
            )),
        }
    }
}
