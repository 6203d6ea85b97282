//! Tests for the asset service and delete reconciliation.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use crate::assets::types::AssetLocation;
    use crate::assets::{
        create_shared_asset_store, Asset, AssetRemote, AssetService, AssetType, DeleteError,
        DeleteOutcome, SelectionReconciler, SharedAssetStore,
    };
    use crate::notifications::{NotificationLevel, Notifications};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Delete(AssetType, String),
        Fetch(AssetType, String),
        List(AssetType),
    }

    /// Recording backend double.
    #[derive(Default)]
    struct MockRemote {
        calls: Mutex<Vec<Call>>,
        fetch_results: HashMap<String, Asset>,
        fail_delete: bool,
        /// Selection the "user" switches to while the delete is in flight
        select_during_delete: Option<(SharedAssetStore, Asset)>,
    }

    impl MockRemote {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls().iter().filter(|c| pred(c)).count()
        }
    }

    #[async_trait]
    impl AssetRemote for MockRemote {
        async fn delete_asset(&self, asset_type: AssetType, id: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Delete(asset_type, id.to_string()));
            if self.fail_delete {
                return Err(anyhow!("backend refused delete"));
            }
            if let Some((store, asset)) = &self.select_during_delete {
                store.write().await.install_selection(asset.clone());
            }
            Ok(())
        }

        async fn fetch_asset(&self, asset_type: AssetType, id: &str) -> Result<Asset> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Fetch(asset_type, id.to_string()));
            self.fetch_results
                .get(id)
                .cloned()
                .ok_or_else(|| anyhow!("asset {} not found", id))
        }

        async fn list_assets(&self, asset_type: AssetType) -> Result<Vec<Asset>> {
            self.calls.lock().unwrap().push(Call::List(asset_type));
            Ok(self
                .fetch_results
                .values()
                .filter(|a| a.asset_type == asset_type)
                .cloned()
                .collect())
        }
    }

    fn builtin_material(id: &str) -> Asset {
        let mut asset = Asset::new(id, AssetType::Material);
        asset.usage = "built-in".to_string();
        asset
    }

    fn override_material(id: &str) -> Asset {
        let mut asset = Asset::new(id, AssetType::Material).with_override(true);
        asset.usage = "project override".to_string();
        asset
    }

    struct Fixture {
        store: SharedAssetStore,
        remote: Arc<MockRemote>,
        notifications: Notifications,
        reconciler: SelectionReconciler,
    }

    async fn fixture(
        asset_type: AssetType,
        assets: Vec<Asset>,
        selected: Option<&str>,
        remote: MockRemote,
    ) -> Fixture {
        let store = create_shared_asset_store();
        {
            let mut guard = store.write().await;
            for asset in assets {
                guard.upsert(asset);
            }
            if let Some(id) = selected {
                assert!(guard.select(id));
            }
        }
        let remote = Arc::new(remote);
        let notifications = Notifications::new();
        let service = AssetService::new(store.clone(), remote.clone());
        let reconciler = SelectionReconciler::new(service, asset_type, notifications.clone());
        Fixture {
            store,
            remote,
            notifications,
            reconciler,
        }
    }

    #[tokio::test]
    async fn test_delete_selected_override_reloads_default() {
        let default = builtin_material("a1");
        let remote = MockRemote {
            fetch_results: HashMap::from([("a1".to_string(), default.clone())]),
            ..Default::default()
        };
        let fx = fixture(
            AssetType::Material,
            vec![override_material("a1")],
            Some("a1"),
            remote,
        )
        .await;

        let outcome = fx.reconciler.handle_delete("a1").await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Reloaded(default.clone()));

        assert_eq!(
            fx.remote.calls(),
            vec![
                Call::Delete(AssetType::Material, "a1".to_string()),
                Call::Fetch(AssetType::Material, "a1".to_string()),
            ]
        );

        let store = fx.store.read().await;
        let selection = store.selection();
        assert_eq!(selection.selected.as_ref(), Some(&default));
        assert_eq!(selection.last_saved.as_ref(), Some(&default));
        assert!(!selection.is_dirty());
        assert_eq!(store.get("a1").unwrap().defined_in, AssetLocation::Aiconsole);
    }

    #[tokio::test]
    async fn test_delete_selected_agent_override_reloads_default() {
        let mut default = Asset::new("coder", AssetType::Agent);
        default.usage = "built-in".to_string();
        let remote = MockRemote {
            fetch_results: HashMap::from([("coder".to_string(), default.clone())]),
            ..Default::default()
        };
        let fx = fixture(
            AssetType::Agent,
            vec![Asset::new("coder", AssetType::Agent).with_override(true)],
            Some("coder"),
            remote,
        )
        .await;

        let outcome = fx.reconciler.handle_delete("coder").await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Reloaded(default.clone()));
        assert_eq!(
            fx.remote.calls(),
            vec![
                Call::Delete(AssetType::Agent, "coder".to_string()),
                Call::Fetch(AssetType::Agent, "coder".to_string()),
            ]
        );

        let store = fx.store.read().await;
        assert_eq!(store.selection().selected.as_ref(), Some(&default));
        assert_eq!(store.selection().last_saved.as_ref(), Some(&default));
    }

    #[tokio::test]
    async fn test_delete_selected_non_override_leaves_stale_selection() {
        let fx = fixture(
            AssetType::Material,
            vec![builtin_material("a1")],
            Some("a1"),
            MockRemote::default(),
        )
        .await;

        let outcome = fx.reconciler.handle_delete("a1").await.unwrap();
        assert_eq!(
            outcome,
            DeleteOutcome::SelectionStale {
                id: "a1".to_string()
            }
        );

        assert_eq!(fx.remote.count(|c| matches!(c, Call::Delete(..))), 1);
        assert_eq!(fx.remote.count(|c| matches!(c, Call::Fetch(..))), 0);

        let store = fx.store.read().await;
        assert_eq!(store.selected_id(), Some("a1"));
        assert!(store.get("a1").is_none());
    }

    #[tokio::test]
    async fn test_delete_other_asset_keeps_selection() {
        let fx = fixture(
            AssetType::Material,
            vec![builtin_material("a1"), override_material("b2")],
            Some("b2"),
            MockRemote::default(),
        )
        .await;
        let before = fx.store.read().await.selection().clone();

        let outcome = fx.reconciler.handle_delete("a1").await.unwrap();
        assert_eq!(outcome, DeleteOutcome::NotSelected);

        assert_eq!(
            fx.remote.calls(),
            vec![Call::Delete(AssetType::Material, "a1".to_string())]
        );
        let store = fx.store.read().await;
        assert_eq!(store.selection(), &before);
        assert!(store.get("a1").is_none());
        assert!(store.get("b2").is_some());
    }

    #[tokio::test]
    async fn test_delete_with_nothing_selected() {
        let fx = fixture(
            AssetType::Agent,
            vec![Asset::new("ag1", AssetType::Agent)],
            None,
            MockRemote::default(),
        )
        .await;

        let outcome = fx.reconciler.handle_delete("ag1").await.unwrap();
        assert_eq!(outcome, DeleteOutcome::NotSelected);
        assert!(fx.store.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_of_unknown_id_still_calls_backend() {
        let fx = fixture(
            AssetType::Material,
            vec![builtin_material("a1")],
            Some("a1"),
            MockRemote::default(),
        )
        .await;

        let outcome = fx.reconciler.handle_delete("ghost").await.unwrap();
        assert_eq!(outcome, DeleteOutcome::NotSelected);
        assert_eq!(
            fx.remote.calls(),
            vec![Call::Delete(AssetType::Material, "ghost".to_string())]
        );
        assert_eq!(fx.store.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_failure_mutates_nothing() {
        let remote = MockRemote {
            fail_delete: true,
            ..Default::default()
        };
        let fx = fixture(
            AssetType::Material,
            vec![override_material("a1")],
            Some("a1"),
            remote,
        )
        .await;

        let err = fx.reconciler.handle_delete("a1").await.unwrap_err();
        assert!(matches!(err, DeleteError::Delete { ref id, .. } if id == "a1"));

        assert_eq!(fx.remote.count(|c| matches!(c, Call::Fetch(..))), 0);
        let store = fx.store.read().await;
        assert!(store.get("a1").is_some());
        assert_eq!(store.selected_id(), Some("a1"));
        assert!(store.selection().selected.as_ref().unwrap().override_);
        assert_eq!(fx.notifications.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_replacement_fetch_failure_is_reported() {
        // No fetch result configured: the reload fails.
        let fx = fixture(
            AssetType::Material,
            vec![override_material("a1")],
            Some("a1"),
            MockRemote::default(),
        )
        .await;

        let err = fx.reconciler.handle_delete("a1").await.unwrap_err();
        assert!(matches!(err, DeleteError::ReplacementFetch { ref id, .. } if id == "a1"));
        assert!(std::error::Error::source(&err).is_some());

        // Delete committed, selection left on the old override.
        let store = fx.store.read().await;
        assert!(store.get("a1").is_none());
        assert!(store.selection().selected.as_ref().unwrap().override_);
        drop(store);

        let notes = fx.notifications.drain().await;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert!(notes[0].message.contains("a1"));
    }

    #[tokio::test]
    async fn test_chat_override_flag_never_reloads() {
        let mut chat = Asset::new("c1", AssetType::Chat);
        chat.override_ = true;
        let fx = fixture(AssetType::Chat, vec![chat], Some("c1"), MockRemote::default()).await;

        let outcome = fx.reconciler.handle_delete("c1").await.unwrap();
        assert!(matches!(outcome, DeleteOutcome::SelectionStale { .. }));
        assert_eq!(fx.remote.count(|c| matches!(c, Call::Fetch(..))), 0);
    }

    #[tokio::test]
    async fn test_decision_uses_selection_captured_before_delete() {
        // Selected "a1" (override) when delete starts; the user switches to
        // "b2" mid-flight. The reload decision still follows "a1".
        let store_for_switch = create_shared_asset_store();
        let default = builtin_material("a1");
        let other = builtin_material("b2");

        let store = store_for_switch.clone();
        {
            let mut guard = store.write().await;
            guard.upsert(override_material("a1"));
            guard.upsert(other.clone());
            guard.select("a1");
        }
        let remote = Arc::new(MockRemote {
            fetch_results: HashMap::from([("a1".to_string(), default.clone())]),
            select_during_delete: Some((store_for_switch, other.clone())),
            ..Default::default()
        });
        let service = AssetService::new(store.clone(), remote.clone());
        let reconciler = SelectionReconciler::new(service, AssetType::Material, Notifications::new());

        let outcome = reconciler.handle_delete("a1").await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Reloaded(default.clone()));
        assert_eq!(remote.count(|c| matches!(c, Call::Fetch(..))), 1);
        // Last write wins: the reload lands after the user's switch.
        assert_eq!(store.read().await.selected_id(), Some("a1"));
    }

    #[tokio::test]
    async fn test_decision_ignores_selection_made_during_delete() {
        // Nothing relevant selected at start; the user selects the deleted id
        // while the delete is in flight. No reload is attempted.
        let store = create_shared_asset_store();
        store.write().await.upsert(override_material("a1"));
        let remote = Arc::new(MockRemote {
            select_during_delete: Some((store.clone(), override_material("a1"))),
            ..Default::default()
        });
        let service = AssetService::new(store.clone(), remote.clone());
        let reconciler = SelectionReconciler::new(service, AssetType::Material, Notifications::new());

        let outcome = reconciler.handle_delete("a1").await.unwrap();
        assert_eq!(outcome, DeleteOutcome::NotSelected);
        assert_eq!(remote.count(|c| matches!(c, Call::Fetch(..))), 0);
    }

    #[tokio::test]
    async fn test_snapshot_waits_for_writer_holding_the_store() {
        // A writer holds the store when the delete starts and selects the
        // override before releasing it; the snapshot sees that selection.
        let default = builtin_material("a1");
        let remote = MockRemote {
            fetch_results: HashMap::from([("a1".to_string(), default.clone())]),
            ..Default::default()
        };
        let fx = fixture(
            AssetType::Material,
            vec![override_material("a1")],
            None,
            remote,
        )
        .await;

        let mut guard = fx.store.clone().write_owned().await;
        let writer = async move {
            tokio::task::yield_now().await;
            assert!(guard.select("a1"));
            drop(guard);
        };

        let (outcome, ()) = tokio::join!(fx.reconciler.handle_delete("a1"), writer);
        assert_eq!(outcome.unwrap(), DeleteOutcome::Reloaded(default));
        assert_eq!(fx.remote.count(|c| matches!(c, Call::Fetch(..))), 1);
    }

    #[tokio::test]
    async fn test_service_refresh_and_select() {
        let remote = Arc::new(MockRemote {
            fetch_results: HashMap::from([
                ("m1".to_string(), builtin_material("m1")),
                ("m2".to_string(), builtin_material("m2")),
                ("ag1".to_string(), Asset::new("ag1", AssetType::Agent)),
            ]),
            ..Default::default()
        });
        let store = create_shared_asset_store();
        let service = AssetService::new(store.clone(), remote.clone());

        let count = service.refresh(AssetType::Material).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(store.read().await.list(AssetType::Material).len(), 2);
        assert!(store.read().await.get("ag1").is_none());

        let selected = service.select(AssetType::Material, "m2").await.unwrap();
        assert_eq!(selected.id, "m2");
        assert_eq!(store.read().await.selected_id(), Some("m2"));

        assert!(service.select(AssetType::Material, "nope").await.is_err());
        assert_eq!(store.read().await.selected_id(), Some("m2"));
    }
}
