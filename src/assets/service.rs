//! Asset operations that combine the backend with the local store.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use super::store::SharedAssetStore;
use super::types::{Asset, AssetType};

/// Remote source of truth for assets.
#[async_trait]
pub trait AssetRemote: Send + Sync {
    /// Delete an asset. For an override this removes only the project layer.
    async fn delete_asset(&self, asset_type: AssetType, id: &str) -> Result<()>;

    /// Fetch the current representation of an asset.
    async fn fetch_asset(&self, asset_type: AssetType, id: &str) -> Result<Asset>;

    async fn list_assets(&self, asset_type: AssetType) -> Result<Vec<Asset>>;
}

/// Collection-level asset operations over a shared store.
#[derive(Clone)]
pub struct AssetService {
    store: SharedAssetStore,
    remote: Arc<dyn AssetRemote>,
}

impl AssetService {
    pub fn new(store: SharedAssetStore, remote: Arc<dyn AssetRemote>) -> Self {
        Self { store, remote }
    }

    pub fn store(&self) -> &SharedAssetStore {
        &self.store
    }

    pub fn remote(&self) -> &Arc<dyn AssetRemote> {
        &self.remote
    }

    /// Delete remotely, then drop the entry from the local collection.
    ///
    /// On failure the local collection is left as it was.
    pub async fn delete_asset(&self, asset_type: AssetType, id: &str) -> Result<()> {
        self.remote.delete_asset(asset_type, id).await?;

        let removed = self.store.write().await.remove(id);
        debug!(
            "Deleted {} {} (was cached locally: {})",
            asset_type,
            id,
            removed.is_some()
        );
        Ok(())
    }

    /// Reload every asset of one type from the backend.
    pub async fn refresh(&self, asset_type: AssetType) -> Result<usize> {
        let assets = self.remote.list_assets(asset_type).await?;
        let count = assets.len();
        self.store.write().await.replace_all(asset_type, assets);
        info!("Loaded {} {}", count, asset_type.collection());
        Ok(count)
    }

    /// Fetch an asset and make it the current selection.
    pub async fn select(&self, asset_type: AssetType, id: &str) -> Result<Asset> {
        let asset = self.remote.fetch_asset(asset_type, id).await?;
        self.store.write().await.install_selection(asset.clone());
        Ok(asset)
    }
}
