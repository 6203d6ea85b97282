//! Asset collection, selection, and the delete flow.
//!
//! The store is plain state behind a shared lock; every operation that talks
//! to the backend goes through `AssetService`, and the editor-facing delete
//! goes through `SelectionReconciler`.

mod delete;
mod service;
mod store;
mod types;
#[cfg(test)]
mod tests;

pub use delete::{DeleteError, DeleteOutcome, SelectionReconciler};
pub use service::{AssetRemote, AssetService};
pub use store::{create_shared_asset_store, SharedAssetStore};
pub use types::{Asset, AssetType};
