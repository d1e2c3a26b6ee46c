use crate::core::{CURRENT_SCHEMA_VERSION, Difficulty, FIRST_MANUAL_SLOT, InstanceId, SlotNumber};
use crate::storage::{ProfileLayout, SlotFormat};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One save-game profile as recorded in the registry index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceProfile {
    pub id: InstanceId,
    pub name: String,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
    pub last_played_at: DateTime<Utc>,
    #[serde(default)]
    pub play_time_hours: f64,
    pub root_path: PathBuf,
    #[serde(default = "first_manual_slot")]
    pub last_save_slot: SlotNumber,
    #[serde(default)]
    pub format: SlotFormat,
}

fn first_manual_slot() -> SlotNumber {
    FIRST_MANUAL_SLOT
}

impl InstanceProfile {
    pub fn layout(&self) -> ProfileLayout {
        ProfileLayout::new(self.root_path.clone(), self.format)
    }

    pub fn binding(&self) -> ActiveInstance {
        ActiveInstance {
            id: self.id,
            root: self.root_path.clone(),
            format: self.format,
            last_save_slot: self.last_save_slot,
        }
    }
}

/// The `(id, path)` pair the save coordinator binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveInstance {
    pub id: InstanceId,
    pub root: PathBuf,
    pub format: SlotFormat,
    pub last_save_slot: SlotNumber,
}

impl ActiveInstance {
    pub fn layout(&self) -> ProfileLayout {
        ProfileLayout::new(self.root.clone(), self.format)
    }
}

/// Static descriptor written once into `instance_config.<ext>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceDescriptor {
    pub id: InstanceId,
    pub name: String,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
    pub schema_version: u32,
}

impl InstanceDescriptor {
    pub fn for_profile(profile: &InstanceProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name.clone(),
            difficulty: profile.difficulty,
            created_at: profile.created_at,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }
}

/// Contents of the registry index file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegistryIndex {
    #[serde(default = "index_version")]
    pub version: u32,
    #[serde(default)]
    pub active_instance: Option<InstanceId>,
    #[serde(default)]
    pub instances: Vec<InstanceProfile>,
}

pub(crate) fn index_version() -> u32 {
    1
}
