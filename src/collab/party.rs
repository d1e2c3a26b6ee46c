use super::{CollaboratorReport, ItemDefinition, ItemLookup, PartyReport, StateCollaborator};
use crate::core::Result;
use crate::state::{EquipmentSlot, GameState, PartyMember};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct RosterEntry {
    member: PartyMember,
    equipped: BTreeMap<EquipmentSlot, ItemDefinition>,
}

impl RosterEntry {
    fn to_member(&self) -> PartyMember {
        let mut member = self.member.clone();
        member.equipment = self
            .equipped
            .iter()
            .map(|(slot, def)| (*slot, def.id.clone()))
            .collect();
        member
    }
}

#[derive(Debug, Default)]
struct RosterState {
    active_index: usize,
    entries: Vec<RosterEntry>,
}

/// Reference party/equipment owner: roster, HP/MP and per-character loadouts.
pub struct PartyRoster {
    lookup: Arc<dyn ItemLookup>,
    state: Mutex<RosterState>,
}

impl PartyRoster {
    pub const NAME: &'static str = "party";

    pub fn new(lookup: Arc<dyn ItemLookup>) -> Self {
        Self {
            lookup,
            state: Mutex::new(RosterState::default()),
        }
    }

    pub async fn members(&self) -> Vec<PartyMember> {
        let state = self.state.lock().await;
        state.entries.iter().map(RosterEntry::to_member).collect()
    }

    pub async fn active_index(&self) -> usize {
        self.state.lock().await.active_index
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.entries.is_empty()
    }

    pub async fn recruit(&self, member: PartyMember) {
        let equipped = self.resolve_loadout(&member);
        self.state.lock().await.entries.push(RosterEntry { member, equipped });
    }

    /// Switch the controlled character. Returns `false` for an out-of-range index.
    pub async fn set_active(&self, index: usize) -> bool {
        let mut state = self.state.lock().await;
        if index >= state.entries.len() {
            return false;
        }
        state.active_index = index;
        true
    }

    pub async fn set_hp(&self, character_id: &str, hp: f32) -> bool {
        let mut state = self.state.lock().await;
        match state
            .entries
            .iter_mut()
            .find(|entry| entry.member.character_id == character_id)
        {
            Some(entry) => {
                entry.member.hp = hp.clamp(0.0, entry.member.max_hp);
                true
            }
            None => false,
        }
    }

    fn resolve_loadout(&self, member: &PartyMember) -> BTreeMap<EquipmentSlot, ItemDefinition> {
        let mut equipped = BTreeMap::new();
        for (slot, item_id) in &member.equipment {
            match self.lookup.resolve(item_id) {
                Some(definition) => {
                    equipped.insert(*slot, definition);
                }
                None => log::warn!(
                    "party: '{}' has unknown equipment '{}' in {:?}, skipping",
                    member.character_id,
                    item_id,
                    slot
                ),
            }
        }
        equipped
    }
}

#[async_trait]
impl StateCollaborator for PartyRoster {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn pull_current_state(&self) -> Result<CollaboratorReport> {
        let state = self.state.lock().await;
        Ok(CollaboratorReport {
            source: Self::NAME.to_string(),
            inventory: None,
            party: Some(PartyReport {
                active_index: state.active_index,
                members: state.entries.iter().map(RosterEntry::to_member).collect(),
            }),
        })
    }

    async fn push_loaded_state(&self, loaded: &GameState) -> Result<()> {
        let entries: Vec<RosterEntry> = loaded
            .party
            .members
            .iter()
            .map(|member| RosterEntry {
                member: member.clone(),
                equipped: self.resolve_loadout(member),
            })
            .collect();

        let mut state = self.state.lock().await;
        state.active_index = if loaded.party.active_index < entries.len() {
            loaded.party.active_index
        } else {
            0
        };
        state.entries = entries;
        Ok(())
    }

    async fn clear_all(&self) {
        *self.state.lock().await = RosterState::default();
    }
}
