//! Session-scoped asset collection and selection state.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::types::{Asset, AssetType};

/// The asset currently open in the editor plus its last-saved baseline.
///
/// `selected` is a copy of the store entry, not a borrow of it: deleting the
/// entry from the collection leaves the selection untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub selected: Option<Asset>,
    pub last_saved: Option<Asset>,
}

impl Selection {
    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_ref().map(|a| a.id.as_str())
    }

    /// Set live selection and baseline together.
    pub fn install(&mut self, asset: Asset) {
        self.last_saved = Some(asset.clone());
        self.selected = Some(asset);
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.last_saved = None;
    }

    /// True when the live copy has edits not reflected in the baseline.
    pub fn is_dirty(&self) -> bool {
        self.selected != self.last_saved
    }
}

/// Canonical asset collection keyed by id, plus the current selection.
#[derive(Debug, Default)]
pub struct AssetStore {
    assets: HashMap<String, Asset>,
    selection: Selection,
}

/// Shared asset store type for async operations
pub type SharedAssetStore = Arc<RwLock<AssetStore>>;

pub fn create_shared_asset_store() -> SharedAssetStore {
    Arc::new(RwLock::new(AssetStore::default()))
}

impl AssetStore {
    pub fn upsert(&mut self, asset: Asset) {
        self.assets.insert(asset.id.clone(), asset);
    }

    /// Replace every entry of `asset_type` with `assets`; other types are kept.
    pub fn replace_all(&mut self, asset_type: AssetType, assets: Vec<Asset>) {
        self.assets.retain(|_, a| a.asset_type != asset_type);
        for asset in assets {
            self.upsert(asset);
        }
    }

    /// Assets of one type, sorted by id.
    pub fn list(&self, asset_type: AssetType) -> Vec<&Asset> {
        let mut assets: Vec<&Asset> = self
            .assets
            .values()
            .filter(|a| a.asset_type == asset_type)
            .collect();
        assets.sort_by(|a, b| a.id.cmp(&b.id));
        assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Remove an entry. The selection is not touched.
    pub fn remove(&mut self, id: &str) -> Option<Asset> {
        self.assets.remove(id)
    }

    /// Install an asset as selection and baseline, and refresh its collection entry.
    pub fn install_selection(&mut self, asset: Asset) {
        self.upsert(asset.clone());
        self.selection.install(asset);
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selection.selected_id()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }
}

#[cfg(test)]
impl AssetStore {
    pub fn get(&self, id: &str) -> Option<&Asset> {
        self.assets.get(id)
    }

    /// Select an asset already in the collection. Returns false if unknown.
    pub fn select(&mut self, id: &str) -> bool {
        match self.assets.get(id) {
            Some(asset) => {
                let asset = asset.clone();
                self.selection.install(asset);
                true
            }
            None => false,
        }
    }

    /// Mutable access to the live selection (editor changes).
    pub fn selected_mut(&mut self) -> Option<&mut Asset> {
        self.selection.selected.as_mut()
    }
}
