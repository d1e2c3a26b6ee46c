pub mod error;
pub mod types;

pub use error::{PersistError, Result};
pub use types::{
    AUTOSAVE_SLOT, CURRENT_SCHEMA_VERSION, Difficulty, FIRST_MANUAL_SLOT, InstanceId, SlotNumber,
    Vec3,
};
