//! Delete flow that keeps the editor selection consistent with the collection.
//!
//! Deleting a project override reveals the built-in asset with the same id,
//! so when the deleted asset is the one open in the editor the built-in
//! definition is fetched and installed in its place. Deleting anything else
//! that happens to be selected leaves the selection pointing at an id that no
//! longer exists; that case is reported back as `DeleteOutcome::SelectionStale`
//! and the caller decides how to resolve it (typically by clearing it).

use tracing::{error, info, warn};

use super::service::AssetService;
use super::types::{Asset, AssetType};
use crate::notifications::Notifications;

/// What happened to the selection after a successful delete.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    /// The deleted asset was not the selected one; selection untouched
    NotSelected,
    /// Selection and baseline now hold the reloaded default definition
    Reloaded(Asset),
    /// Selection still references the deleted id
    SelectionStale { id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    /// Nothing was mutated.
    #[error("Failed to delete {asset_type} '{id}'")]
    Delete {
        asset_type: AssetType,
        id: String,
        #[source]
        source: anyhow::Error,
    },
    /// The delete went through; the selection still references the old override.
    #[error("Deleted {asset_type} '{id}' but failed to reload its default definition")]
    ReplacementFetch {
        asset_type: AssetType,
        id: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Delete handler bound to one asset type, mirroring one editor view.
pub struct SelectionReconciler {
    service: AssetService,
    asset_type: AssetType,
    notifications: Notifications,
}

impl SelectionReconciler {
    pub fn new(service: AssetService, asset_type: AssetType, notifications: Notifications) -> Self {
        Self {
            service,
            asset_type,
            notifications,
        }
    }

    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    /// Delete `id` and reconcile the selection against the post-delete state.
    pub async fn handle_delete(&self, id: &str) -> Result<DeleteOutcome, DeleteError> {
        // Snapshot before the delete is issued; the user may select something
        // else while it is in flight and the decision must not follow that.
        let store = self.service.store();
        let selected_before = match store.try_read() {
            Ok(guard) => guard.selection().selected.clone(),
            // A writer holds the store; wait for it before taking the snapshot
            Err(_) => store.read().await.selection().selected.clone(),
        };

        self.service
            .delete_asset(self.asset_type, id)
            .await
            .map_err(|source| DeleteError::Delete {
                asset_type: self.asset_type,
                id: id.to_string(),
                source,
            })?;

        let Some(selected) = selected_before.filter(|asset| asset.id == id) else {
            return Ok(DeleteOutcome::NotSelected);
        };

        if !(self.asset_type.is_asset() && selected.override_) {
            warn!(
                "Deleted {} '{}' is still selected; selection now references a missing asset",
                self.asset_type, id
            );
            return Ok(DeleteOutcome::SelectionStale { id: id.to_string() });
        }

        let replacement = match self.service.remote().fetch_asset(self.asset_type, id).await {
            Ok(asset) => asset,
            Err(source) => {
                let detail = format!("{:#}", source);
                let err = DeleteError::ReplacementFetch {
                    asset_type: self.asset_type,
                    id: id.to_string(),
                    source,
                };
                error!("{}: {}", err, detail);
                self.notifications
                    .push_error("Failed to reload asset", format!("{}: {}", err, detail))
                    .await;
                return Err(err);
            }
        };

        self.service
            .store()
            .write()
            .await
            .install_selection(replacement.clone());

        info!(
            "Override of {} '{}' removed; reloaded default definition",
            self.asset_type, id
        );
        Ok(DeleteOutcome::Reloaded(replacement))
    }
}
