//! Canonical game-state aggregate and the records it is made of.

use crate::core::{CURRENT_SCHEMA_VERSION, Difficulty, FIRST_MANUAL_SLOT, SlotNumber};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod inventory;
pub mod party;
pub mod player;
pub mod world;

pub use inventory::{EquipmentLoadout, EquipmentSlot, InventoryData, ItemRecord, ItemStack};
pub use party::{PartyData, PartyMember};
pub use player::{PlayerData, VehicleState};
pub use world::{DefeatedEnemy, QuestProgress, WorldData};

/// Everything that belongs to one profile's running game.
///
/// `Clone` is the snapshot mechanism: the save path clones the live value,
/// merges collaborator reports into the clone, and writes the clone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub save_slot: SlotNumber,
    #[serde(default)]
    pub save_date: Option<DateTime<Utc>>,
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub is_new_game: bool,
    #[serde(default)]
    pub player: PlayerData,
    #[serde(default)]
    pub inventory: InventoryData,
    #[serde(default)]
    pub world: WorldData,
    #[serde(default)]
    pub party: PartyData,
}

fn legacy_schema_version() -> u32 {
    1
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            save_slot: FIRST_MANUAL_SLOT,
            save_date: None,
            schema_version: CURRENT_SCHEMA_VERSION,
            is_new_game: true,
            player: PlayerData::default(),
            inventory: InventoryData::default(),
            world: WorldData::default(),
            party: PartyData::default(),
        }
    }
}

impl GameState {
    /// Seed a never-saved game with default starting values.
    pub fn new_game(
        player_name: impl Into<String>,
        difficulty: Difficulty,
        starting_items: Vec<ItemStack>,
    ) -> Self {
        let player_name = player_name.into();
        let mut leader = PartyMember::new("leader", player_name.clone());
        let (currency, max_hp) = match difficulty {
            Difficulty::Story => (250, 150.0),
            Difficulty::Normal => (100, 100.0),
            Difficulty::Hard => (25, 80.0),
        };
        leader.max_hp = max_hp;
        leader.hp = max_hp;

        let mut state = Self {
            player: PlayerData {
                max_health: max_hp,
                health: max_hp,
                ..PlayerData::named(player_name)
            },
            inventory: InventoryData {
                currency,
                items: starting_items,
                shared_equipment: EquipmentLoadout::new(),
            },
            party: PartyData {
                active_index: 0,
                members: vec![leader],
            },
            ..Self::default()
        };
        state.normalize();
        state
    }

    /// Bring nested records into a consistent shape before they are serialized.
    pub fn normalize(&mut self) {
        self.inventory.normalize();
        self.world.normalize();
        self.party.normalize();
        self.player.clamp_vitals();
    }

    /// Mark this value as the durable content of `slot` written at `now`.
    pub fn stamp(&mut self, slot: SlotNumber, now: DateTime<Utc>) {
        self.save_slot = slot;
        self.save_date = Some(now);
        self.is_new_game = false;
        self.schema_version = CURRENT_SCHEMA_VERSION;
    }

    /// Copy the fields a successful save accepted from `snapshot` into `self`.
    ///
    /// World records and position are owned by the live game loop and are not
    /// copied back.
    pub fn accept_saved_fields(&mut self, snapshot: &GameState) {
        self.inventory.currency = snapshot.inventory.currency;
        self.inventory.items = snapshot.inventory.items.clone();
        self.inventory.shared_equipment = snapshot.inventory.shared_equipment.clone();

        self.player.health = snapshot.player.health;
        self.player.max_health = snapshot.player.max_health;
        self.player.mana = snapshot.player.mana;
        self.player.max_mana = snapshot.player.max_mana;
        self.player.level = snapshot.player.level;
        self.player.experience = snapshot.player.experience;

        self.party.members = snapshot.party.members.clone();
        self.party.active_index = snapshot.party.active_index;

        self.save_slot = snapshot.save_slot;
        self.save_date = snapshot.save_date;
        self.is_new_game = false;
        self.schema_version = snapshot.schema_version;
    }
}
