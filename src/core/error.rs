use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("No active profile selected")]
    NoActiveProfile,

    #[error("No live game state for the active profile")]
    NoLiveState,

    #[error("Slot {0} is not a valid target for this operation")]
    InvalidSlot(u32),

    #[error("Save file '{}' not found", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to deserialize '{}': {reason}", path.display())]
    Deserialization { path: PathBuf, reason: String },

    #[error("Failed to write '{}': {reason}", path.display())]
    PartialWriteRisk { path: PathBuf, reason: String },

    #[error("Instance limit reached ({0} profiles)")]
    InstanceLimitReached(usize),

    #[error("Instance {0} not found")]
    UnknownInstance(u32),

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("The active profile changed while the operation was running")]
    ProfileSwitched,

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(&'static str),

    #[error("Collaborator '{name}' failed: {reason}")]
    Collaborator { name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, PersistError>;

impl From<std::io::Error> for PersistError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl PersistError {
    /// True for failures `load` reports as "nothing to load" rather than as a fault.
    pub fn is_missing_or_corrupt(&self) -> bool {
        matches!(
            self,
            PersistError::FileNotFound(_) | PersistError::Deserialization { .. }
        )
    }
}
