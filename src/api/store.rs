//! API layer bound to a validated backend location.
//!
//! `ApiStore` is created unconfigured and becomes usable only after
//! `initialize()` has reached the backend. Every asset call made before that
//! fails instead of guessing a URL.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, error, info};
use url::Url;

use super::client::ApiClient;
use super::types::ValidationResult;
use crate::assets::{Asset, AssetRemote, AssetType};
use crate::startup::ApiInitializer;

pub struct ApiStore {
    client: Arc<ApiClient>,
    configured_url: String,
    base_url: RwLock<Option<Url>>,
}

impl ApiStore {
    pub fn new(client: Arc<ApiClient>, configured_url: impl Into<String>) -> Self {
        Self {
            client,
            configured_url: configured_url.into(),
            base_url: RwLock::new(None),
        }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Validated backend URL, or an error if `initialize()` has not succeeded.
    pub async fn base_url(&self) -> Result<Url> {
        self.base_url
            .read()
            .await
            .clone()
            .ok_or_else(|| anyhow!("API layer is not initialized"))
    }

    async fn asset_url(&self, asset_type: AssetType, id: Option<&str>) -> Result<Url> {
        let base = self.base_url().await?;
        match id {
            Some(id) => ApiClient::endpoint(&base, &["api", asset_type.collection(), id]),
            None => ApiClient::endpoint(&base, &["api", asset_type.collection()]),
        }
    }
}

#[cfg(test)]
impl ApiStore {
    pub async fn is_ready(&self) -> bool {
        self.base_url.read().await.is_some()
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).with_context(|| format!("Invalid API URL: {}", raw))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Invalid API URL: {} (expected http or https)", raw);
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[async_trait]
impl ApiInitializer for ApiStore {
    async fn initialize(&self) -> Result<()> {
        let url = parse_base_url(&self.configured_url).map_err(|e| {
            error!("❌ {:#}", e);
            error!("   Please check ASSETDESK_API_URL or --api-url");
            e
        })?;

        match self.client.validate_connection(&url).await {
            ValidationResult::Ok => {
                debug!("Backend reachable at {}", url);
            }
            ValidationResult::InvalidUrl(msg) => {
                error!("❌ {}", msg);
                error!("   Please check ASSETDESK_API_URL or --api-url");
                bail!(msg);
            }
            ValidationResult::ConnectionError(msg) => {
                error!("❌ {}", msg);
                error!("   Is the backend running?");
                bail!(msg);
            }
            ValidationResult::ServerError(msg) | ValidationResult::UnexpectedStatus(msg) => {
                error!("❌ {}", msg);
                bail!(msg);
            }
        }

        *self.base_url.write().await = Some(url.clone());
        info!("✅ API layer ready at {}", url);
        Ok(())
    }
}

#[async_trait]
impl AssetRemote for ApiStore {
    async fn delete_asset(&self, asset_type: AssetType, id: &str) -> Result<()> {
        let url = self.asset_url(asset_type, Some(id)).await?;
        self.client
            .delete(&url)
            .await
            .with_context(|| format!("Failed to delete {} '{}'", asset_type, id))
    }

    async fn fetch_asset(&self, asset_type: AssetType, id: &str) -> Result<Asset> {
        let url = self.asset_url(asset_type, Some(id)).await?;
        let asset: Asset = self
            .client
            .get_json(&url)
            .await
            .with_context(|| format!("Failed to fetch {} '{}'", asset_type, id))?;

        if asset.id != id || asset.asset_type != asset_type {
            bail!(
                "Backend returned {} '{}' when asked for {} '{}'",
                asset.asset_type,
                asset.id,
                asset_type,
                id
            );
        }
        Ok(asset)
    }

    async fn list_assets(&self, asset_type: AssetType) -> Result<Vec<Asset>> {
        let url = self.asset_url(asset_type, None).await?;
        self.client
            .get_json(&url)
            .await
            .with_context(|| format!("Failed to list {}", asset_type.collection()))
    }
}
