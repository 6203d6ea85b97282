//! Session context.
//!
//! Owns every subsystem of one client session. Components receive what they
//! need from here instead of reaching for process-wide globals, so tests can
//! build as many independent sessions as they like.

use anyhow::Result;
use std::sync::Arc;

use crate::api::{ApiClient, ApiStore};
use crate::assets::{
    create_shared_asset_store, AssetService, AssetType, SelectionReconciler, SharedAssetStore,
};
use crate::config::AppConfig;
use crate::connectivity::ConnectivityProbe;
use crate::notifications::Notifications;
use crate::realtime::RealtimeChannel;
use crate::recent::RecentProjectsStore;
use crate::settings::SettingsStore;
use crate::startup::BootstrapSequencer;

pub struct Runtime {
    pub api: Arc<ApiStore>,
    pub settings: Arc<SettingsStore>,
    pub connectivity: Arc<ConnectivityProbe>,
    pub realtime: Arc<RealtimeChannel>,
    pub recent: Arc<RecentProjectsStore>,
    pub assets: SharedAssetStore,
    pub notifications: Notifications,
}

impl Runtime {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Arc::new(ApiClient::new()?);
        let api = Arc::new(ApiStore::new(client, config.api_url.clone()));

        Ok(Self {
            realtime: Arc::new(RealtimeChannel::new(api.clone())),
            api,
            settings: Arc::new(SettingsStore::new(&config.cache_dir)),
            connectivity: Arc::new(ConnectivityProbe::new(config.probe_url.clone())?),
            recent: Arc::new(RecentProjectsStore::new(&config.cache_dir)),
            assets: create_shared_asset_store(),
            notifications: Notifications::new(),
        })
    }

    /// Sequencer wired to this session's subsystems.
    pub fn sequencer(&self) -> BootstrapSequencer {
        BootstrapSequencer::new(
            self.api.clone(),
            self.settings.clone(),
            self.connectivity.clone(),
            self.realtime.clone(),
            self.recent.clone(),
        )
    }

    pub fn asset_service(&self) -> AssetService {
        AssetService::new(self.assets.clone(), self.api.clone())
    }

    /// Delete handler for one asset collection.
    pub fn delete_handler(&self, asset_type: AssetType) -> SelectionReconciler {
        SelectionReconciler::new(self.asset_service(), asset_type, self.notifications.clone())
    }
}
