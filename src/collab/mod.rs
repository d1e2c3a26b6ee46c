//! Contract between the persistence core and the gameplay subsystems that own live state.
//!
//! The core only talks to collaborators through [`StateCollaborator`]:
//! - `pull_current_state` during a save (read-only)
//! - `push_loaded_state` after a load
//! - `clear_all` on every profile switch
//! - `starting_loadout` when a new game is seeded

use crate::core::Result;
use crate::state::{EquipmentLoadout, GameState, ItemRecord, ItemStack, PartyMember};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

pub mod catalog;
pub mod inventory;
pub mod party;
pub mod placement;

pub use catalog::{ItemCatalog, ItemDefinition, ItemLookup};
pub use inventory::InventoryLedger;
pub use party::PartyRoster;
pub use placement::{
    ActorId, ActorPlacement, PLAYER_ACTOR, PlacementReport, PlacementRequest, SimulationMode,
    place_actors,
};

/// Inventory values reported by the inventory owner.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InventoryReport {
    pub currency: u64,
    pub items: Vec<ItemRecord>,
    pub shared_equipment: EquipmentLoadout,
}

/// Party values reported by the party/equipment owner.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartyReport {
    pub active_index: usize,
    pub members: Vec<PartyMember>,
}

/// What one collaborator knows at pull time. Sections it does not own stay `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollaboratorReport {
    pub source: String,
    pub inventory: Option<InventoryReport>,
    pub party: Option<PartyReport>,
}

impl CollaboratorReport {
    pub fn empty(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Write the reported values into `snapshot`.
    ///
    /// HP/MP caps on the player follow the active party member.
    pub fn merge_into(&self, snapshot: &mut GameState) {
        if let Some(inventory) = &self.inventory {
            snapshot.inventory.currency = inventory.currency;
            snapshot.inventory.items = inventory.items.clone();
            snapshot.inventory.shared_equipment = inventory.shared_equipment.clone();
        }

        if let Some(party) = &self.party {
            snapshot.party.members = party.members.clone();
            snapshot.party.active_index = party.active_index;
            if let Some(active) = snapshot.party.active_member() {
                let (max_hp, max_mp, level) = (active.max_hp, active.max_mp, active.level);
                snapshot.player.max_health = max_hp;
                snapshot.player.max_mana = max_mp;
                snapshot.player.level = snapshot.player.level.max(level);
                snapshot.player.clamp_vitals();
            }
        }
    }
}

#[async_trait]
pub trait StateCollaborator: Send + Sync {
    fn name(&self) -> &str;

    /// Report authoritative current values. Must not mutate collaborator state.
    async fn pull_current_state(&self) -> Result<CollaboratorReport>;

    /// Apply the parts of a freshly loaded state this collaborator owns.
    async fn push_loaded_state(&self, state: &GameState) -> Result<()>;

    /// Drop everything loaded for the previous profile.
    async fn clear_all(&self);

    /// Items this collaborator seeds into a new game.
    fn starting_loadout(&self) -> Vec<ItemStack> {
        Vec::new()
    }
}

/// The registered collaborators, shared by the registry and the coordinator.
#[derive(Clone, Default)]
pub struct CollaboratorSet {
    members: Vec<Arc<dyn StateCollaborator>>,
}

impl CollaboratorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, collaborator: Arc<dyn StateCollaborator>) -> Self {
        self.members.push(collaborator);
        self
    }

    pub fn register(&mut self, collaborator: Arc<dyn StateCollaborator>) {
        self.members.push(collaborator);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Ask every collaborator for its values. Failed pulls are logged and left out.
    pub async fn pull_all(&self) -> Vec<CollaboratorReport> {
        let results = join_all(self.members.iter().map(|c| c.pull_current_state())).await;
        results
            .into_iter()
            .zip(&self.members)
            .filter_map(|(result, collaborator)| match result {
                Ok(report) => Some(report),
                Err(err) => {
                    log::warn!(
                        "collaborator '{}' pull failed, keeping live values: {}",
                        collaborator.name(),
                        err
                    );
                    None
                }
            })
            .collect()
    }

    /// Hand a loaded state to each collaborator in registration order.
    /// Returns the number of collaborators that applied it.
    pub async fn push_all(&self, state: &GameState) -> usize {
        let mut applied = 0;
        for collaborator in &self.members {
            match collaborator.push_loaded_state(state).await {
                Ok(()) => applied += 1,
                Err(err) => log::warn!(
                    "collaborator '{}' failed to apply loaded state: {}",
                    collaborator.name(),
                    err
                ),
            }
        }
        applied
    }

    pub async fn clear_all(&self) {
        join_all(self.members.iter().map(|c| c.clear_all())).await;
    }

    pub fn starting_loadout(&self) -> Vec<ItemStack> {
        self.members
            .iter()
            .flat_map(|c| c.starting_loadout())
            .collect()
    }
}

impl std::fmt::Debug for CollaboratorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.members.iter().map(|c| c.name()))
            .finish()
    }
}
