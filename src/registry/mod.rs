//! Instance registry: the authoritative list of profiles and which one is active.

use crate::collab::CollaboratorSet;
use crate::config::PersistenceConfig;
use crate::core::{Difficulty, InstanceId, PersistError, Result, SlotNumber};
use crate::storage::{
    SharedPreferences, SlotFormat, atomic_write, read_if_exists, remove_dir_if_exists,
};
use chrono::Utc;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::watch;

pub mod naming;
pub mod profile;

pub use naming::{folder_name, sanitize_name};
pub use profile::{ActiveInstance, InstanceDescriptor, InstanceProfile, RegistryIndex};

pub struct InstanceRegistry {
    instances_dir: PathBuf,
    index_path: PathBuf,
    max_instances: usize,
    max_slot: SlotNumber,
    format: SlotFormat,
    profiles: Vec<InstanceProfile>,
    active_id: Option<InstanceId>,
    collaborators: CollaboratorSet,
    preferences: Option<SharedPreferences>,
    binding: watch::Sender<Option<ActiveInstance>>,
}

impl InstanceRegistry {
    /// Open the registry under `config.save_root`, healing the index against the filesystem.
    ///
    /// Profiles whose root directory has disappeared are dropped and the index is rewritten.
    /// The stored active pointer is restored and published, so a coordinator attached to
    /// the reopened registry binds the same profile.
    pub async fn open(config: &PersistenceConfig, collaborators: CollaboratorSet) -> Result<Self> {
        let instances_dir = config.instances_dir();
        fs::create_dir_all(&instances_dir).await.map_err(|err| {
            PersistError::Io(format!(
                "Failed to create instances directory '{}': {}",
                instances_dir.display(),
                err
            ))
        })?;

        let index_path = config.index_path();
        let index = Self::read_index(&index_path).await?;
        let (binding, _) = watch::channel(None);

        let mut registry = Self {
            instances_dir,
            index_path,
            max_instances: config.registry.max_instances,
            max_slot: config.slots.max_slot,
            format: config.slots.format,
            profiles: Vec::new(),
            active_id: None,
            collaborators,
            preferences: None,
            binding,
        };

        let stored_count = index.instances.len();
        let mut healed = false;
        for profile in index.instances {
            if fs::try_exists(&profile.root_path).await.unwrap_or(false) {
                registry.profiles.push(profile);
            } else {
                debug!(
                    "dropping instance {} ('{}'): root '{}' no longer exists",
                    profile.id,
                    profile.name,
                    profile.root_path.display()
                );
                healed = true;
            }
        }

        registry.active_id = index
            .active_instance
            .filter(|id| registry.profiles.iter().any(|p| p.id == *id));
        if registry.active_id != index.active_instance {
            healed = true;
        }

        if healed {
            info!(
                "instance index healed: {} of {} profiles kept",
                registry.profiles.len(),
                stored_count
            );
            registry.persist().await?;
        }

        registry
            .binding
            .send_replace(registry.active_instance().map(InstanceProfile::binding));
        Ok(registry)
    }

    /// Share the hint store so deleting a profile also forgets its last-slot hint.
    pub fn with_preferences(mut self, preferences: SharedPreferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    async fn read_index(index_path: &Path) -> Result<RegistryIndex> {
        let Some(bytes) = read_if_exists(index_path).await? else {
            return Ok(RegistryIndex {
                version: profile::index_version(),
                ..RegistryIndex::default()
            });
        };

        match serde_json::from_slice::<RegistryIndex>(&bytes) {
            Ok(index) => Ok(index),
            Err(err) => {
                let quarantine = index_path.with_extension(format!(
                    "json.corrupt-{}",
                    Utc::now().timestamp_millis()
                ));
                warn!(
                    "instance index '{}' is unreadable ({}), moving it to '{}'",
                    index_path.display(),
                    err,
                    quarantine.display()
                );
                fs::rename(index_path, &quarantine).await?;
                Ok(RegistryIndex {
                    version: profile::index_version(),
                    ..RegistryIndex::default()
                })
            }
        }
    }

    async fn persist(&self) -> Result<()> {
        let index = RegistryIndex {
            version: profile::index_version(),
            active_instance: self.active_id,
            instances: self.profiles.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&index).map_err(|err| {
            PersistError::PartialWriteRisk {
                path: self.index_path.clone(),
                reason: err.to_string(),
            }
        })?;
        atomic_write(&self.index_path, bytes).await
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Create a profile, persist it and make it active.
    pub async fn create_instance(
        &mut self,
        name: &str,
        difficulty: Difficulty,
    ) -> Result<InstanceId> {
        if self.profiles.len() >= self.max_instances {
            return Err(PersistError::InstanceLimitReached(self.max_instances));
        }

        let id = self.profiles.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let root = self.instances_dir.join(folder_name(id, name));

        // Only an orphan can sit here: every indexed root carries a different id prefix.
        if remove_dir_if_exists(&root).await? {
            warn!(
                "removed orphaned directory '{}' before creating instance {}",
                root.display(),
                id
            );
        }

        let now = Utc::now();
        let profile = InstanceProfile {
            id,
            name: name.trim().to_string(),
            difficulty,
            created_at: now,
            last_played_at: now,
            play_time_hours: 0.0,
            root_path: root,
            last_save_slot: crate::core::FIRST_MANUAL_SLOT,
            format: self.format,
        };

        let layout = profile.layout();
        for dir in [layout.slots_dir(), layout.backups_dir()] {
            fs::create_dir_all(&dir).await.map_err(|err| {
                PersistError::Io(format!(
                    "Failed to create '{}': {}",
                    dir.display(),
                    err
                ))
            })?;
        }

        let config_path = layout.config_path();
        let descriptor = layout
            .format()
            .encode(&InstanceDescriptor::for_profile(&profile), &config_path)?;
        atomic_write(&config_path, descriptor).await?;

        info!(
            "created instance {} ('{}', {}) at '{}'",
            id,
            profile.name,
            difficulty,
            profile.root_path.display()
        );
        self.profiles.push(profile);
        self.persist().await?;

        self.select_instance(id).await?;
        Ok(id)
    }

    /// Make `id` the active profile. Returns `false` for an unknown id.
    ///
    /// The binding is withdrawn before collaborators are cleared, and collaborators are
    /// cleared before the pointer moves. A save whose pull overlaps the switch sees the
    /// withdrawal and discards its snapshot.
    pub async fn select_instance(&mut self, id: InstanceId) -> Result<bool> {
        if !self.profiles.iter().any(|p| p.id == id) {
            warn!("select_instance: unknown instance {}", id);
            return Ok(false);
        }

        self.binding.send_replace(None);
        self.collaborators.clear_all().await;

        let previous = self.active_id.replace(id);
        let binding = {
            let profile = self
                .profile_mut(id)
                .ok_or(PersistError::UnknownInstance(id))?;
            profile.last_played_at = Utc::now();
            profile.binding()
        };
        if let Err(err) = self.persist().await {
            self.active_id = previous;
            self.binding
                .send_replace(self.active_instance().map(InstanceProfile::binding));
            return Err(err);
        }

        debug!("instance {} selected, publishing binding", id);
        self.binding.send_replace(Some(binding));
        Ok(true)
    }

    /// Remove a profile and everything under its root. Irreversible.
    pub async fn delete_instance(&mut self, id: InstanceId) -> Result<bool> {
        let Some(position) = self.profiles.iter().position(|p| p.id == id) else {
            return Ok(false);
        };

        let root = self.profiles[position].root_path.clone();
        if !root.starts_with(&self.instances_dir) || root == self.instances_dir {
            return Err(PersistError::Io(format!(
                "Refusing to delete '{}': outside '{}'",
                root.display(),
                self.instances_dir.display()
            )));
        }

        if self.active_id == Some(id) {
            self.active_id = None;
            self.binding.send_replace(None);
        }
        remove_dir_if_exists(&root).await?;

        let removed = self.profiles.remove(position);
        self.persist().await?;

        // Ids are reused after the highest profile goes, so its hint must go too.
        if let Some(preferences) = &self.preferences {
            if let Err(err) = preferences.lock().await.clear_last_slot(id).await {
                warn!("failed to clear last-slot hint of instance {}: {}", id, err);
            }
        }
        info!("deleted instance {} ('{}')", removed.id, removed.name);
        Ok(true)
    }

    /// Record the slot most recently written. Out-of-range slots and unknown ids are ignored.
    pub async fn update_last_save_slot(&mut self, id: InstanceId, slot: SlotNumber) -> Result<()> {
        if slot < crate::core::FIRST_MANUAL_SLOT || slot > self.max_slot {
            debug!("update_last_save_slot: slot {} out of range, ignoring", slot);
            return Ok(());
        }
        let Some(profile) = self.profile_mut(id) else {
            return Ok(());
        };
        if profile.last_save_slot == slot {
            return Ok(());
        }
        profile.last_save_slot = slot;
        self.persist().await
    }

    /// Accumulate played time on a profile.
    pub async fn add_play_time(&mut self, id: InstanceId, hours: f64) -> Result<()> {
        if !hours.is_finite() || hours <= 0.0 {
            return Ok(());
        }
        let Some(profile) = self.profile_mut(id) else {
            return Ok(());
        };
        profile.play_time_hours += hours;
        self.persist().await
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn has_active_instance(&self) -> bool {
        self.active_id.is_some()
    }

    pub fn active_instance(&self) -> Option<&InstanceProfile> {
        self.active_id.and_then(|id| self.instance(id))
    }

    pub fn active_id(&self) -> Option<InstanceId> {
        self.active_id
    }

    pub fn list_instances(&self) -> &[InstanceProfile] {
        &self.profiles
    }

    pub fn instance(&self, id: InstanceId) -> Option<&InstanceProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn instance_count(&self) -> usize {
        self.profiles.len()
    }

    pub fn max_instances(&self) -> usize {
        self.max_instances
    }

    pub fn max_slot(&self) -> SlotNumber {
        self.max_slot
    }

    pub fn can_create_instance(&self) -> bool {
        self.profiles.len() < self.max_instances
    }

    pub fn instances_dir(&self) -> &Path {
        &self.instances_dir
    }

    /// Receiver for the active `(id, path)` binding.
    pub fn subscribe(&self) -> watch::Receiver<Option<ActiveInstance>> {
        self.binding.subscribe()
    }

    fn profile_mut(&mut self, id: InstanceId) -> Option<&mut InstanceProfile> {
        self.profiles.iter_mut().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{InventoryLedger, ItemCatalog};
    use crate::storage::PreferenceStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn open(dir: &TempDir) -> InstanceRegistry {
        let config = PersistenceConfig::new(dir.path()).max_instances(3);
        InstanceRegistry::open(&config, CollaboratorSet::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_builds_layout_and_activates() {
        let dir = TempDir::new().unwrap();
        let mut registry = open(&dir).await;

        let id = registry
            .create_instance("Ada", Difficulty::Hard)
            .await
            .unwrap();

        assert_eq!(id, 1);
        let profile = registry.active_instance().unwrap();
        assert_eq!(profile.name, "Ada");
        assert!(profile.root_path.join("slots").is_dir());
        assert!(profile.root_path.join("backups").is_dir());
        assert!(profile.root_path.join("instance_config.json").is_file());
        assert_eq!(registry.subscribe().borrow().as_ref().unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_ids_are_max_plus_one() {
        let dir = TempDir::new().unwrap();
        let mut registry = open(&dir).await;
        let a = registry.create_instance("A", Difficulty::Normal).await.unwrap();
        let b = registry.create_instance("B", Difficulty::Normal).await.unwrap();
        assert!(registry.delete_instance(a).await.unwrap());

        let c = registry.create_instance("C", Difficulty::Normal).await.unwrap();
        assert_eq!((a, b, c), (1, 2, 3));
    }

    #[tokio::test]
    async fn test_limit_is_enforced() {
        let dir = TempDir::new().unwrap();
        let mut registry = open(&dir).await;
        for name in ["a", "b", "c"] {
            registry.create_instance(name, Difficulty::Normal).await.unwrap();
        }

        let err = registry
            .create_instance("d", Difficulty::Normal)
            .await
            .unwrap_err();
        assert!(matches!(err, PersistError::InstanceLimitReached(3)));
        assert_eq!(registry.instance_count(), 3);
    }

    #[tokio::test]
    async fn test_select_unknown_is_false() {
        let dir = TempDir::new().unwrap();
        let mut registry = open(&dir).await;
        assert!(!registry.select_instance(42).await.unwrap());
        assert!(!registry.has_active_instance());
    }

    #[tokio::test]
    async fn test_select_clears_collaborators() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(InventoryLedger::new(Arc::new(ItemCatalog::default())));
        let config = PersistenceConfig::new(dir.path());
        let mut registry =
            InstanceRegistry::open(&config, CollaboratorSet::new().with(ledger.clone()))
                .await
                .unwrap();
        let a = registry.create_instance("A", Difficulty::Normal).await.unwrap();
        ledger.add_currency(500).await;

        registry.create_instance("B", Difficulty::Normal).await.unwrap();
        assert!(ledger.is_empty().await);

        ledger.add_currency(5).await;
        registry.select_instance(a).await.unwrap();
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_active_clears_pointer_and_binding() {
        let dir = TempDir::new().unwrap();
        let mut registry = open(&dir).await;
        let id = registry.create_instance("A", Difficulty::Normal).await.unwrap();
        let root = registry.instance(id).unwrap().root_path.clone();
        let rx = registry.subscribe();

        assert!(registry.delete_instance(id).await.unwrap());

        assert!(!registry.has_active_instance());
        assert!(rx.borrow().is_none());
        assert!(!root.exists());
        assert!(!registry.delete_instance(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_reopen_drops_profiles_with_missing_roots() {
        let dir = TempDir::new().unwrap();
        let (kept, gone_root) = {
            let mut registry = open(&dir).await;
            let kept = registry.create_instance("keep", Difficulty::Normal).await.unwrap();
            let gone = registry.create_instance("gone", Difficulty::Normal).await.unwrap();
            (kept, registry.instance(gone).unwrap().root_path.clone())
        };
        std::fs::remove_dir_all(&gone_root).unwrap();

        let registry = open(&dir).await;

        assert_eq!(registry.list_instances().len(), 1);
        assert_eq!(registry.list_instances()[0].id, kept);
        // the dropped profile was active; the pointer must not survive it
        assert!(!registry.has_active_instance());

        let index: RegistryIndex =
            serde_json::from_slice(&std::fs::read(dir.path().join("instances/index.json")).unwrap())
                .unwrap();
        assert_eq!(index.instances.len(), 1);
        assert_eq!(index.active_instance, None);
    }

    #[tokio::test]
    async fn test_corrupt_index_is_quarantined() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("instances")).unwrap();
        std::fs::write(dir.path().join("instances/index.json"), "not json").unwrap();

        let registry = open(&dir).await;

        assert!(registry.list_instances().is_empty());
        let quarantined = std::fs::read_dir(dir.path().join("instances"))
            .unwrap()
            .filter_map(|e| e.ok())
            .any(|e| e.file_name().to_string_lossy().contains("corrupt"));
        assert!(quarantined);
    }

    #[tokio::test]
    async fn test_update_last_save_slot_ignores_out_of_range() {
        let dir = TempDir::new().unwrap();
        let mut registry = open(&dir).await;
        let id = registry.create_instance("A", Difficulty::Normal).await.unwrap();

        registry.update_last_save_slot(id, 4).await.unwrap();
        registry.update_last_save_slot(id, 0).await.unwrap();
        registry.update_last_save_slot(id, 11).await.unwrap();

        assert_eq!(registry.instance(id).unwrap().last_save_slot, 4);
    }

    #[tokio::test]
    async fn test_orphaned_directory_is_wiped_on_create() {
        let dir = TempDir::new().unwrap();
        let orphan = dir.path().join("instances").join("001_ada").join("slots");
        std::fs::create_dir_all(&orphan).unwrap();
        std::fs::write(orphan.join("slot_1.json"), "{}").unwrap();

        let mut registry = open(&dir).await;
        registry.create_instance("Ada", Difficulty::Normal).await.unwrap();

        assert!(!orphan.join("slot_1.json").exists());
    }

    #[tokio::test]
    async fn test_reopen_publishes_stored_active_profile() {
        let dir = TempDir::new().unwrap();
        let id = {
            let mut registry = open(&dir).await;
            registry.create_instance("A", Difficulty::Normal).await.unwrap();
            registry.create_instance("B", Difficulty::Normal).await.unwrap()
        };

        let registry = open(&dir).await;

        assert_eq!(registry.active_id(), Some(id));
        let rx = registry.subscribe();
        let binding = rx.borrow();
        assert_eq!(binding.as_ref().map(|b| b.id), Some(id));
        assert_eq!(
            binding.as_ref().map(|b| b.root.clone()),
            registry.instance(id).map(|p| p.root_path.clone())
        );
    }

    #[tokio::test]
    async fn test_refused_delete_keeps_active_profile() {
        let dir = TempDir::new().unwrap();
        let mut registry = open(&dir).await;
        let id = registry.create_instance("A", Difficulty::Normal).await.unwrap();
        let elsewhere = dir.path().join("elsewhere");
        std::fs::create_dir_all(&elsewhere).unwrap();
        registry.profile_mut(id).unwrap().root_path = elsewhere.clone();
        let rx = registry.subscribe();

        let err = registry.delete_instance(id).await.unwrap_err();

        assert!(matches!(err, PersistError::Io(_)));
        assert_eq!(registry.active_id(), Some(id));
        assert_eq!(rx.borrow().as_ref().map(|b| b.id), Some(id));
        assert_eq!(registry.instance_count(), 1);
        assert!(elsewhere.is_dir());
    }

    #[tokio::test]
    async fn test_delete_forgets_last_slot_hint() {
        let dir = TempDir::new().unwrap();
        let preferences = PreferenceStore::detached().shared();
        let mut registry = open(&dir).await.with_preferences(preferences.clone());
        registry.create_instance("A", Difficulty::Normal).await.unwrap();
        let id = registry.create_instance("B", Difficulty::Normal).await.unwrap();
        preferences.lock().await.set_last_slot(id, 7).await.unwrap();

        assert!(registry.delete_instance(id).await.unwrap());
        assert_eq!(preferences.lock().await.last_slot(id), None);

        // the highest id is handed out again and must start without a hint
        let reused = registry.create_instance("C", Difficulty::Normal).await.unwrap();
        assert_eq!(reused, id);
        assert_eq!(preferences.lock().await.last_slot(reused), None);
    }
}
