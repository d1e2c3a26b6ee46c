use crate::core::{PersistError, Result};
use crate::storage::SlotFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Limits for the instance registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryPolicy {
    /// Maximum number of profiles that may exist at once.
    pub max_instances: usize,
}

impl Default for RegistryPolicy {
    fn default() -> Self {
        Self { max_instances: 5 }
    }
}

/// Slot addressing and encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotPolicy {
    /// Highest manual slot number. Manual slots are `1..=max_slot`.
    pub max_slot: u32,
    /// Encoding used for slot files of newly created profiles.
    pub format: SlotFormat,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            max_slot: 10,
            format: SlotFormat::Json,
        }
    }
}

/// Bounded waits used while bringing services up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupPolicy {
    /// How long to wait for the instance registry before falling back to legacy mode.
    pub registry_wait_ms: u64,
    /// How long to wait for the save coordinator before aborting startup.
    pub coordinator_wait_ms: u64,
    /// Scheduler ticks to yield after a profile switch before trusting collaborator state.
    pub profile_switch_ticks: u32,
    /// How long to wait for a placed actor to report it has settled.
    pub settle_wait_ms: u64,
    /// Profile name used when a new game is requested without one.
    pub default_profile_name: String,
}

impl Default for StartupPolicy {
    fn default() -> Self {
        Self {
            registry_wait_ms: 5_000,
            coordinator_wait_ms: 5_000,
            profile_switch_ticks: 2,
            settle_wait_ms: 1_000,
            default_profile_name: "New Adventure".to_string(),
        }
    }
}

impl StartupPolicy {
    pub fn registry_wait(&self) -> Duration {
        Duration::from_millis(self.registry_wait_ms)
    }

    pub fn coordinator_wait(&self) -> Duration {
        Duration::from_millis(self.coordinator_wait_ms)
    }

    pub fn settle_wait(&self) -> Duration {
        Duration::from_millis(self.settle_wait_ms)
    }
}

/// Periodic autosave into slot 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosavePolicy {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for AutosavePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 300,
        }
    }
}

/// Thresholds used by the slot repair scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairPolicy {
    /// Maximum distance between a boarded player and the vehicle they are aboard.
    pub vehicle_tolerance: f32,
}

impl Default for RepairPolicy {
    fn default() -> Self {
        Self {
            vehicle_tolerance: 5.0,
        }
    }
}

/// Top-level configuration for the persistence services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Root under which the index, preferences and every profile live.
    pub save_root: PathBuf,
    pub registry: RegistryPolicy,
    pub slots: SlotPolicy,
    pub startup: StartupPolicy,
    pub autosave: AutosavePolicy,
    pub repair: RepairPolicy,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            save_root: PathBuf::from("saves"),
            registry: RegistryPolicy::default(),
            slots: SlotPolicy::default(),
            startup: StartupPolicy::default(),
            autosave: AutosavePolicy::default(),
            repair: RepairPolicy::default(),
        }
    }
}

impl PersistenceConfig {
    /// Create a configuration rooted at `save_root` with default policies
    pub fn new(save_root: impl Into<PathBuf>) -> Self {
        Self {
            save_root: save_root.into(),
            ..Self::default()
        }
    }

    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|err| {
            PersistError::Config(format!("Failed to read '{}': {}", path.display(), err))
        })?;
        let config: Self = serde_json::from_slice(&bytes).map_err(|err| {
            PersistError::Config(format!("Failed to parse '{}': {}", path.display(), err))
        })?;
        Ok(config.normalized())
    }

    /// Set the maximum profile count
    pub fn max_instances(mut self, max: usize) -> Self {
        self.registry.max_instances = max;
        self
    }

    /// Set the highest manual slot
    pub fn max_slot(mut self, max_slot: u32) -> Self {
        self.slots.max_slot = max_slot;
        self
    }

    /// Set the slot encoding for new profiles
    pub fn format(mut self, format: SlotFormat) -> Self {
        self.slots.format = format;
        self
    }

    /// Set both service readiness waits
    pub fn startup_waits(mut self, registry: Duration, coordinator: Duration) -> Self {
        self.startup.registry_wait_ms = registry.as_millis() as u64;
        self.startup.coordinator_wait_ms = coordinator.as_millis() as u64;
        self
    }

    /// Set the autosave interval
    pub fn autosave_every(mut self, interval: Duration) -> Self {
        self.autosave.interval_secs = interval.as_secs();
        self
    }

    /// Clamp values that would make the services unusable.
    pub fn normalized(mut self) -> Self {
        self.registry.max_instances = self.registry.max_instances.max(1);
        self.slots.max_slot = self.slots.max_slot.max(1);
        self.autosave.interval_secs = self.autosave.interval_secs.max(1);
        self.repair.vehicle_tolerance = self.repair.vehicle_tolerance.max(0.0);
        if self.startup.default_profile_name.trim().is_empty() {
            self.startup.default_profile_name = StartupPolicy::default().default_profile_name;
        }
        self
    }

    pub fn instances_dir(&self) -> PathBuf {
        self.save_root.join("instances")
    }

    pub fn index_path(&self) -> PathBuf {
        self.instances_dir().join("index.json")
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.save_root.join("preferences.json")
    }

    pub fn legacy_root(&self) -> PathBuf {
        self.save_root.join("legacy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_file_takes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("savekeep.json");
        std::fs::write(
            &path,
            r#"{ "save_root": "/tmp/x", "registry": { "max_instances": 0 }, "slots": { "format": "msgpack" } }"#,
        )
        .unwrap();

        let config = PersistenceConfig::from_file(&path).unwrap();
        assert_eq!(config.save_root, PathBuf::from("/tmp/x"));
        assert_eq!(config.registry.max_instances, 1);
        assert_eq!(config.slots.max_slot, 10);
        assert_eq!(config.slots.format, SlotFormat::MessagePack);
        assert_eq!(config.startup.profile_switch_ticks, 2);
    }

    #[test]
    fn test_unparseable_config_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = PersistenceConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, PersistError::Config(_)));
    }

    #[test]
    fn test_well_known_paths() {
        let config = PersistenceConfig::new("/data/saves");
        assert_eq!(
            config.index_path(),
            PathBuf::from("/data/saves/instances/index.json")
        );
        assert_eq!(
            config.preferences_path(),
            PathBuf::from("/data/saves/preferences.json")
        );
        assert_eq!(config.legacy_root(), PathBuf::from("/data/saves/legacy"));
    }
}
