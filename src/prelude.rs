//! Recommended imports grouped by who is doing the importing.
//!
//! `game` is what a host game needs to start a session and save/load.
//! `collaborator` is what a gameplay subsystem needs to take part in saves.

pub mod game {
    //! Host-facing surface: wiring, startup and the save coordinator.
    pub use crate::bootstrap::{
        AutosaveWorker, BootstrapSequencer, StartupMode, StartupOutcome, StartupReport,
        spawn_autosave_worker,
    };
    pub use crate::config::PersistenceConfig;
    pub use crate::coordinator::{SaveCoordinator, SaveReceipt, SlotStatus, SlotSummary};
    pub use crate::core::{Difficulty, PersistError, Result, SlotNumber};
    pub use crate::services::ServiceContainer;
}

pub mod collaborator {
    //! Contracts a subsystem implements to own part of the game state.
    pub use crate::collab::{
        ActorPlacement, CollaboratorReport, InventoryReport, ItemDefinition, ItemLookup,
        PartyReport, SimulationMode, StateCollaborator,
    };
    pub use crate::state::{GameState, ItemStack, PartyMember};
}
