//! Atomic file writes and the slot file store for one profile root.

use super::ProfileLayout;
use crate::core::{PersistError, Result, SlotNumber};
use crate::state::GameState;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;

// ============================================================================
// File helpers
// ============================================================================

/// Replace `path` with `bytes` so that readers only ever see the old or the new content.
///
/// The bytes go to a temp file in the same directory, are synced, then renamed over the target.
pub async fn atomic_write(path: &Path, bytes: Vec<u8>) -> Result<()> {
    let parent = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&parent)
        .await
        .map_err(|err| PersistError::PartialWriteRisk {
            path: path.to_path_buf(),
            reason: format!(
                "Failed to create parent directory '{}': {}",
                parent.display(),
                err
            ),
        })?;

    let target = path.to_path_buf();
    let write = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|err| err.error)?;
        Ok(())
    })
    .await
    .map_err(|err| PersistError::PartialWriteRisk {
        path: path.to_path_buf(),
        reason: format!("write task failed: {}", err),
    })?;

    write.map_err(|err| PersistError::PartialWriteRisk {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Read a whole file, `None` when it does not exist.
pub async fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(PersistError::Io(format!(
            "Failed to read '{}': {}",
            path.display(),
            err
        ))),
    }
}

/// Recursively delete a directory. Returns `false` when it was already gone.
pub async fn remove_dir_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(PersistError::Io(format!(
            "Failed to delete '{}': {}",
            path.display(),
            err
        ))),
    }
}

// ============================================================================
// Slot Store
// ============================================================================

/// Reads and writes `GameState` slot files under one profile root.
#[derive(Debug, Clone)]
pub struct SlotStore {
    layout: ProfileLayout,
}

impl SlotStore {
    pub fn new(layout: ProfileLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ProfileLayout {
        &self.layout
    }

    pub fn path(&self, slot: SlotNumber) -> PathBuf {
        self.layout.slot_path(slot)
    }

    /// Serialize then atomically write. Returns the number of bytes written.
    pub async fn write(&self, slot: SlotNumber, state: &GameState) -> Result<usize> {
        let path = self.path(slot);
        let bytes = self.layout.format().encode(state, &path)?;
        let len = bytes.len();
        atomic_write(&path, bytes).await?;
        Ok(len)
    }

    /// Decode a slot. A missing file is `FileNotFound`, a bad one `Deserialization`.
    pub async fn read(&self, slot: SlotNumber) -> Result<GameState> {
        let path = self.path(slot);
        let bytes = read_if_exists(&path)
            .await?
            .ok_or_else(|| PersistError::FileNotFound(path.clone()))?;
        let state: GameState = self.layout.format().decode(&bytes, &path)?;
        if state.schema_version > crate::core::CURRENT_SCHEMA_VERSION {
            return Err(PersistError::Deserialization {
                path,
                reason: format!(
                    "schema version {} is newer than supported version {}",
                    state.schema_version,
                    crate::core::CURRENT_SCHEMA_VERSION
                ),
            });
        }
        Ok(state)
    }

    pub async fn exists(&self, slot: SlotNumber) -> bool {
        fs::try_exists(self.path(slot)).await.unwrap_or(false)
    }

    /// Remove a slot file. Returns `false` when there was nothing to remove.
    pub async fn delete(&self, slot: SlotNumber) -> Result<bool> {
        let path = self.path(slot);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(PersistError::Io(format!(
                "Failed to delete '{}': {}",
                path.display(),
                err
            ))),
        }
    }

    /// Slot numbers that have a file on disk, ascending.
    pub async fn occupied_slots(&self) -> Result<Vec<SlotNumber>> {
        let dir = self.layout.slots_dir();
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut slots = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            if let Some(slot) = file_name
                .to_str()
                .and_then(|name| self.layout.parse_slot_file_name(name))
            {
                slots.push(slot);
            }
        }
        slots.sort_unstable();
        Ok(slots)
    }
}
