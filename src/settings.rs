//! Persisted user settings.
//!
//! Settings live in `<cache_dir>/settings.json`. Loading never fails: a
//! missing file means defaults, an unreadable or corrupt one is reported and
//! replaced by defaults in memory (the file is left alone until the next save).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info, warn};

use crate::startup::SettingsInitializer;

/// Settings stored in settings.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SettingsData {
    /// Display name shown in chats
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Run generated code without asking
    pub code_autorun: bool,

    /// Explicit enable/disable overrides per asset id
    pub assets: HashMap<String, bool>,
}

pub struct SettingsStore {
    settings_path: PathBuf,
    data: RwLock<SettingsData>,
}

impl SettingsStore {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            settings_path: cache_dir.join("settings.json"),
            data: RwLock::new(SettingsData::default()),
        }
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    fn read_file(&self) -> Result<Option<SettingsData>> {
        if !self.settings_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.settings_path)
            .with_context(|| format!("Failed to read settings file: {:?}", self.settings_path))?;

        let data = serde_json::from_str(&content).context("Failed to parse settings JSON")?;
        Ok(Some(data))
    }

    /// Snapshot of the current settings.
    pub fn get(&self) -> SettingsData {
        match self.data.read() {
            Ok(data) => data.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Apply a change in memory and persist it.
    pub fn update(&self, change: impl FnOnce(&mut SettingsData)) -> Result<()> {
        let snapshot = {
            let mut data = match self.data.write() {
                Ok(data) => data,
                Err(poisoned) => poisoned.into_inner(),
            };
            change(&mut data);
            data.clone()
        };
        self.save(&snapshot)
    }

    fn save(&self, data: &SettingsData) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let content =
            serde_json::to_string_pretty(data).context("Failed to serialize settings")?;
        std::fs::write(&self.settings_path, content)
            .with_context(|| format!("Failed to write settings file: {:?}", self.settings_path))?;

        debug!("Settings saved to {:?}", self.settings_path);
        Ok(())
    }

    /// Whether an asset is enabled, falling back to the asset's own default.
    pub fn is_asset_enabled(&self, asset_id: &str, enabled_by_default: bool) -> bool {
        self.get()
            .assets
            .get(asset_id)
            .copied()
            .unwrap_or(enabled_by_default)
    }

    pub fn set_asset_enabled(&self, asset_id: &str, enabled: bool) -> Result<()> {
        self.update(|data| {
            data.assets.insert(asset_id.to_string(), enabled);
        })
    }
}

impl SettingsInitializer for SettingsStore {
    fn initialize_settings(&self) {
        let loaded = match self.read_file() {
            Ok(Some(data)) => {
                info!("⚙️  Settings loaded from {:?}", self.settings_path);
                data
            }
            Ok(None) => {
                debug!("No settings file at {:?}, using defaults", self.settings_path);
                SettingsData::default()
            }
            Err(e) => {
                warn!("Failed to load settings, using defaults: {:#}", e);
                SettingsData::default()
            }
        };

        match self.data.write() {
            Ok(mut data) => *data = loaded,
            Err(poisoned) => *poisoned.into_inner() = loaded,
        }
    }
}
