//! Internet reachability probe.
//!
//! The UI reads the last probed status to warn the user before features
//! that need the outside world (model providers, update checks) are used.
//! The backend API itself is local and is validated separately.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::startup::ConnectivityCheck;

/// Default URL probed for reachability
pub const DEFAULT_PROBE_URL: &str = "https://www.gstatic.com/generate_204";

const PROBE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkStatus {
    Online,
    Offline,
    #[default]
    Unknown,
}

impl std::fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkStatus::Online => write!(f, "online"),
            NetworkStatus::Offline => write!(f, "offline"),
            NetworkStatus::Unknown => write!(f, "unknown"),
        }
    }
}

pub struct ConnectivityProbe {
    client: Client,
    probe_url: String,
    status: RwLock<NetworkStatus>,
}

impl ConnectivityProbe {
    pub fn new(probe_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            probe_url: probe_url.into(),
            status: RwLock::new(NetworkStatus::Unknown),
        })
    }

    /// Last probed status (`Unknown` until the first check).
    pub async fn status(&self) -> NetworkStatus {
        *self.status.read().await
    }

    /// Any HTTP answer counts as online; only transport failures mean offline.
    async fn probe(&self, url: Url) -> NetworkStatus {
        match self.client.head(url).send().await {
            Ok(response) => {
                debug!("Probe answered with HTTP {}", response.status());
                NetworkStatus::Online
            }
            Err(e) => {
                debug!("Probe failed: {}", e);
                NetworkStatus::Offline
            }
        }
    }
}

#[async_trait]
impl ConnectivityCheck for ConnectivityProbe {
    async fn check_status(&self) -> Result<NetworkStatus> {
        let url = Url::parse(&self.probe_url)
            .with_context(|| format!("Invalid probe URL: {}", self.probe_url))?;

        let status = self.probe(url).await;
        *self.status.write().await = status;
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_online_when_probe_answers() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let probe = ConnectivityProbe::new(server.uri()).unwrap();
        assert_eq!(probe.status().await, NetworkStatus::Unknown);
        assert_eq!(probe.check_status().await.unwrap(), NetworkStatus::Online);
        assert_eq!(probe.status().await, NetworkStatus::Online);
    }

    #[tokio::test]
    async fn test_error_status_still_counts_as_online() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let probe = ConnectivityProbe::new(server.uri()).unwrap();
        assert_eq!(probe.check_status().await.unwrap(), NetworkStatus::Online);
    }

    #[tokio::test]
    async fn test_offline_when_unreachable() {
        // Port 9 (discard) on localhost is normally closed.
        let probe = ConnectivityProbe::new("http://127.0.0.1:9/").unwrap();
        assert_eq!(probe.check_status().await.unwrap(), NetworkStatus::Offline);
        assert_eq!(probe.status().await, NetworkStatus::Offline);
    }

    #[tokio::test]
    async fn test_invalid_probe_url_is_an_error() {
        let probe = ConnectivityProbe::new("not a url").unwrap();
        assert!(probe.check_status().await.is_err());
        assert_eq!(probe.status().await, NetworkStatus::Unknown);
    }
}
