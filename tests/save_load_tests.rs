//! Integration tests for the save and load paths of the coordinator

use savekeep::collab::{InventoryLedger, ItemCatalog, StateCollaborator};
use savekeep::core::Result as PersistResult;
use savekeep::registry::RegistryIndex;
use savekeep::storage::PreferenceStore;
use savekeep::{
    CollaboratorReport, Difficulty, GameState, PersistError, PersistenceConfig, SaveCoordinator,
    ServiceContainer, SharedRegistry, SlotStatus, Vec3,
};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Notify;

async fn start(services: &ServiceContainer) -> (SharedRegistry, SaveCoordinator) {
    let registry = services.start_registry().await.unwrap();
    let coordinator = services.start_coordinator().await.unwrap();
    coordinator.attach_registry(registry.clone()).await;
    (registry, coordinator)
}

async fn with_profile(temp_dir: &TempDir) -> (SharedRegistry, SaveCoordinator, PathBuf) {
    let services = ServiceContainer::new(PersistenceConfig::new(temp_dir.path()));
    let (registry, coordinator) = start(&services).await;
    let id = registry
        .lock()
        .await
        .create_instance("Ada", Difficulty::Normal)
        .await
        .unwrap();
    let root = registry.lock().await.instance(id).unwrap().root_path.clone();
    coordinator
        .start_new_game(GameState::new_game("Ada", Difficulty::Normal, Vec::new()))
        .await
        .unwrap();
    (registry, coordinator, root)
}

#[tokio::test]
async fn test_explicit_save_to_slot_zero_writes_slot_one() {
    let temp_dir = TempDir::new().unwrap();
    let (_, coordinator, root) = with_profile(&temp_dir).await;

    let receipt = coordinator.save(0).await.unwrap();

    assert_eq!(receipt.slot, 1);
    assert!(!receipt.autosave);
    assert!(root.join("slots/slot_1.json").is_file());
    assert!(!root.join("slots/slot_0.json").exists());
}

#[tokio::test]
async fn test_missing_slot_leaves_state_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let (_, coordinator, _) = with_profile(&temp_dir).await;
    let before = coordinator.active_state().await.unwrap();

    assert!(!coordinator.load(7).await);
    assert!(matches!(
        coordinator.try_load(7).await,
        Err(PersistError::FileNotFound(_))
    ));
    assert_eq!(coordinator.active_state().await.unwrap(), before);
}

#[tokio::test]
async fn test_corrupt_slot_leaves_state_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let (_, coordinator, root) = with_profile(&temp_dir).await;
    std::fs::create_dir_all(root.join("slots")).unwrap();
    std::fs::write(root.join("slots/slot_2.json"), b"{\"saveSlot\": 2, \"player\": ").unwrap();
    let before = coordinator.active_state().await.unwrap();

    assert!(!coordinator.load(2).await);
    assert!(matches!(
        coordinator.try_load(2).await,
        Err(PersistError::Deserialization { .. })
    ));
    assert_eq!(coordinator.active_state().await.unwrap(), before);
}

#[tokio::test]
async fn test_round_trip_and_repeated_load() {
    let temp_dir = TempDir::new().unwrap();
    let services = ServiceContainer::new(PersistenceConfig::new(temp_dir.path()));
    let (registry, coordinator) = start(&services).await;
    registry
        .lock()
        .await
        .create_instance("Ada", Difficulty::Hard)
        .await
        .unwrap();

    let mut state = GameState::new_game("Ada", Difficulty::Hard, Vec::new());
    state.inventory.currency = 1234;
    state.player.position = Vec3::new(4.0, 1.5, -9.0);
    coordinator.start_new_game(state).await.unwrap();
    coordinator.save(3).await.unwrap();

    coordinator
        .start_new_game(GameState::new_game("Someone Else", Difficulty::Story, Vec::new()))
        .await
        .unwrap();
    assert!(coordinator.load(3).await);
    let first = coordinator.active_state().await.unwrap();

    assert_eq!(first.player.name, "Ada");
    assert_eq!(first.inventory.currency, 1234);
    assert_eq!(first.player.position, Vec3::new(4.0, 1.5, -9.0));
    assert_eq!(first.save_slot, 3);
    assert!(!first.is_new_game);

    assert!(coordinator.load(3).await);
    assert_eq!(coordinator.active_state().await.unwrap(), first);
}

#[tokio::test]
async fn test_hint_record_and_file_agree_after_save() {
    let temp_dir = TempDir::new().unwrap();
    let config = PersistenceConfig::new(temp_dir.path());
    let (registry, coordinator, root) = with_profile(&temp_dir).await;
    let id = coordinator.active_instance_id().await.unwrap();

    coordinator.save(4).await.unwrap();

    let hint = PreferenceStore::open(config.preferences_path())
        .await
        .unwrap()
        .last_slot(id);
    assert_eq!(hint, Some(4));
    assert_eq!(registry.lock().await.instance(id).unwrap().last_save_slot, 4);

    let index: RegistryIndex =
        serde_json::from_slice(&std::fs::read(config.index_path()).unwrap()).unwrap();
    let recorded = index.instances.iter().find(|p| p.id == id).unwrap();
    assert_eq!(recorded.last_save_slot, 4);

    let on_disk: GameState =
        serde_json::from_slice(&std::fs::read(root.join("slots/slot_4.json")).unwrap()).unwrap();
    assert_eq!(on_disk.save_slot, 4);
    assert!(on_disk.save_date.is_some());
}

#[tokio::test]
async fn test_autosave_without_profile_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let services = ServiceContainer::new(PersistenceConfig::new(temp_dir.path()));
    let (_, coordinator) = start(&services).await;

    assert!(coordinator.autosave().await.is_none());
    assert!(matches!(
        coordinator.save(1).await,
        Err(PersistError::NoActiveProfile)
    ));

    let profile_dirs = std::fs::read_dir(temp_dir.path().join("instances"))
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .count();
    assert_eq!(profile_dirs, 0);
    assert!(!temp_dir.path().join("legacy").exists());
}

#[tokio::test]
async fn test_failed_pull_keeps_live_values() {
    struct Offline;

    #[async_trait::async_trait]
    impl StateCollaborator for Offline {
        fn name(&self) -> &str {
            "offline"
        }
        async fn pull_current_state(&self) -> PersistResult<CollaboratorReport> {
            Err(PersistError::Collaborator {
                name: "offline".to_string(),
                reason: "not loaded".to_string(),
            })
        }
        async fn push_loaded_state(&self, _state: &GameState) -> PersistResult<()> {
            Ok(())
        }
        async fn clear_all(&self) {}
    }

    let temp_dir = TempDir::new().unwrap();
    let services = ServiceContainer::new(PersistenceConfig::new(temp_dir.path()))
        .with_collaborator(Arc::new(Offline));
    let (registry, coordinator) = start(&services).await;
    registry
        .lock()
        .await
        .create_instance("Ada", Difficulty::Story)
        .await
        .unwrap();
    coordinator
        .start_new_game(GameState::new_game("Ada", Difficulty::Story, Vec::new()))
        .await
        .unwrap();

    coordinator.save(1).await.unwrap();
    assert!(coordinator.load(1).await);
    assert_eq!(coordinator.active_state().await.unwrap().inventory.currency, 250);
}

struct Gate {
    entered: Notify,
    release: Notify,
}

#[async_trait::async_trait]
impl StateCollaborator for Gate {
    fn name(&self) -> &str {
        "gate"
    }

    async fn pull_current_state(&self) -> PersistResult<CollaboratorReport> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(CollaboratorReport::empty("gate"))
    }

    async fn push_loaded_state(&self, _state: &GameState) -> PersistResult<()> {
        Ok(())
    }

    async fn clear_all(&self) {}
}

#[tokio::test]
async fn test_second_save_while_in_flight_is_dropped() {
    let temp_dir = TempDir::new().unwrap();
    let gate = Arc::new(Gate {
        entered: Notify::new(),
        release: Notify::new(),
    });
    let services = ServiceContainer::new(PersistenceConfig::new(temp_dir.path()))
        .with_collaborator(gate.clone());
    let (registry, coordinator) = start(&services).await;
    registry
        .lock()
        .await
        .create_instance("Ada", Difficulty::Normal)
        .await
        .unwrap();
    coordinator
        .start_new_game(GameState::new_game("Ada", Difficulty::Normal, Vec::new()))
        .await
        .unwrap();

    let first = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.save(1).await }
    });
    gate.entered.notified().await;

    assert!(matches!(
        coordinator.save(2).await,
        Err(PersistError::SaveInProgress)
    ));
    assert!(coordinator.autosave().await.is_none());

    gate.release.notify_one();
    let receipt = first.await.unwrap().unwrap();
    assert_eq!(receipt.slot, 1);
    assert!(!coordinator.exists(2).await);
    assert!(!coordinator.exists(0).await);

    // the flag is released once the first save completes
    gate.release.notify_one();
    assert_eq!(coordinator.save(2).await.unwrap().slot, 2);
}

#[tokio::test]
async fn test_ledger_values_are_saved_and_pushed_back() {
    let temp_dir = TempDir::new().unwrap();
    let ledger = Arc::new(InventoryLedger::new(Arc::new(ItemCatalog::default())));
    let services = ServiceContainer::new(PersistenceConfig::new(temp_dir.path()))
        .with_collaborator(ledger.clone());
    let (registry, coordinator) = start(&services).await;
    registry
        .lock()
        .await
        .create_instance("Ada", Difficulty::Normal)
        .await
        .unwrap();
    coordinator
        .start_new_game(GameState::new_game("Ada", Difficulty::Normal, Vec::new()))
        .await
        .unwrap();

    ledger
        .add_item(savekeep::state::ItemRecord::stack("potion", 3))
        .await;
    coordinator.save(1).await.unwrap();
    assert_eq!(
        coordinator
            .active_state()
            .await
            .unwrap()
            .inventory
            .quantity_of("potion"),
        3
    );

    ledger.add_item(savekeep::state::ItemRecord::stack("potion", 5)).await;
    assert!(coordinator.load(1).await);
    assert_eq!(ledger.items().await[0].quantity, 3);
}

#[tokio::test]
async fn test_reopened_services_bind_the_stored_profile() {
    let temp_dir = TempDir::new().unwrap();
    let config = PersistenceConfig::new(temp_dir.path());
    {
        let (_, coordinator, _) = with_profile(&temp_dir).await;
        coordinator.save(1).await.unwrap();
    }

    let services = ServiceContainer::new(config);
    let (registry, coordinator) = start(&services).await;

    assert_eq!(registry.lock().await.active_id(), Some(1));
    assert!(coordinator.has_active_profile().await);
    assert_eq!(coordinator.active_instance_id().await, Some(1));

    let slots = coordinator.list_slots().await.unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].slot, 1);
    assert!(matches!(
        &slots[0].status,
        SlotStatus::Readable { player_name, .. } if player_name == "Ada"
    ));
    assert_eq!(coordinator.resume().await.unwrap(), Some(1));
}
