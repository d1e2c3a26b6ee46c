// ============================================================================
// savekeep: multi-profile save persistence
// ============================================================================

pub mod bootstrap;
pub mod collab;
pub mod config;
pub mod coordinator;
pub mod core;
pub mod prelude;
pub mod registry;
pub mod services;
pub mod state;
pub mod storage;

// Re-export main types for convenience
pub use crate::core::{Difficulty, InstanceId, PersistError, Result, SlotNumber, Vec3};
pub use crate::config::PersistenceConfig;
pub use state::GameState;

// Re-export the three services
pub use bootstrap::{BootstrapSequencer, StartupMode, StartupOutcome, StartupReport};
pub use coordinator::{LoadReceipt, RepairReport, SaveCoordinator, SaveReceipt, SlotStatus, SlotSummary};
pub use registry::{InstanceProfile, InstanceRegistry};
pub use services::{ServiceContainer, SharedRegistry};

// Re-export collaborator contracts
pub use collab::{ActorPlacement, CollaboratorReport, CollaboratorSet, ItemLookup, StateCollaborator};
