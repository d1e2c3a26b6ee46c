use super::persistence::{atomic_write, read_if_exists};
use crate::core::{InstanceId, Result, SlotNumber};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// One store shared by the registry and the coordinator so neither flushes a stale copy.
pub type SharedPreferences = Arc<Mutex<PreferenceStore>>;

const LAST_SLOT_KEY_PREFIX: &str = "lastSlot:";

/// Process-wide key/value store used for fast resume hints.
///
/// Values here are hints only; the registry record is the source of truth.
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl PreferenceStore {
    /// Open the store at `path`. An unreadable file is logged and treated as empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match read_if_exists(&path).await? {
            Some(bytes) => match serde_json::from_slice(&bytes) {
                Ok(values) => values,
                Err(err) => {
                    log::warn!(
                        "preferences file '{}' is unreadable, starting empty: {}",
                        path.display(),
                        err
                    );
                    BTreeMap::new()
                }
            },
            None => BTreeMap::new(),
        };
        Ok(Self { path, values })
    }

    /// In-memory store that is never flushed. Used by legacy mode and tests.
    pub fn detached() -> Self {
        Self {
            path: PathBuf::new(),
            values: BTreeMap::new(),
        }
    }

    pub fn shared(self) -> SharedPreferences {
        Arc::new(Mutex::new(self))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub async fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.values.insert(key.into(), value.into());
        self.flush().await
    }

    pub async fn remove(&mut self, key: &str) -> Result<bool> {
        let removed = self.values.remove(key).is_some();
        if removed {
            self.flush().await?;
        }
        Ok(removed)
    }

    pub fn last_slot_key(id: InstanceId) -> String {
        format!("{}{}", LAST_SLOT_KEY_PREFIX, id)
    }

    pub fn last_slot(&self, id: InstanceId) -> Option<SlotNumber> {
        self.get(&Self::last_slot_key(id))
            .and_then(|value| value.parse().ok())
    }

    pub async fn set_last_slot(&mut self, id: InstanceId, slot: SlotNumber) -> Result<()> {
        self.set(Self::last_slot_key(id), slot.to_string()).await
    }

    pub async fn clear_last_slot(&mut self, id: InstanceId) -> Result<bool> {
        self.remove(&Self::last_slot_key(id)).await
    }

    async fn flush(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }
        let bytes = serde_json::to_vec_pretty(&self.values)
            .map_err(|err| crate::core::PersistError::Io(err.to_string()))?;
        atomic_write(&self.path, bytes).await
    }
}
