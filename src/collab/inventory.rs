use super::{CollaboratorReport, InventoryReport, ItemDefinition, ItemLookup, StateCollaborator};
use crate::core::Result;
use crate::state::{EquipmentLoadout, EquipmentSlot, GameState, ItemRecord, ItemStack};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct LedgerState {
    currency: u64,
    items: Vec<ItemRecord>,
    equipped: BTreeMap<EquipmentSlot, ItemDefinition>,
}

/// Reference inventory owner: currency, item records and the shared loadout.
pub struct InventoryLedger {
    lookup: Arc<dyn ItemLookup>,
    seed: Vec<ItemStack>,
    state: Mutex<LedgerState>,
}

impl InventoryLedger {
    pub const NAME: &'static str = "inventory";

    pub fn new(lookup: Arc<dyn ItemLookup>) -> Self {
        Self {
            lookup,
            seed: Vec::new(),
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Items handed to every new game.
    pub fn with_starting_loadout(mut self, seed: Vec<ItemStack>) -> Self {
        self.seed = seed;
        self
    }

    pub async fn currency(&self) -> u64 {
        self.state.lock().await.currency
    }

    pub async fn items(&self) -> Vec<ItemRecord> {
        self.state.lock().await.items.clone()
    }

    pub async fn equipped(&self, slot: EquipmentSlot) -> Option<ItemDefinition> {
        self.state.lock().await.equipped.get(&slot).cloned()
    }

    pub async fn is_empty(&self) -> bool {
        let state = self.state.lock().await;
        state.currency == 0 && state.items.is_empty() && state.equipped.is_empty()
    }

    pub async fn add_currency(&self, amount: u64) {
        let mut state = self.state.lock().await;
        state.currency = state.currency.saturating_add(amount);
    }

    pub async fn set_currency(&self, amount: u64) {
        self.state.lock().await.currency = amount;
    }

    pub async fn add_item(&self, record: ItemRecord) {
        let mut state = self.state.lock().await;
        if record.stackable {
            if let Some(existing) = state
                .items
                .iter_mut()
                .find(|item| item.stackable && item.item_id == record.item_id)
            {
                existing.quantity = existing.quantity.saturating_add(record.quantity);
                return;
            }
        }
        state.items.push(record);
    }

    /// Equip a known item. Returns `false` if the id does not resolve.
    pub async fn equip(&self, slot: EquipmentSlot, item_id: &str) -> bool {
        let Some(definition) = self.lookup.resolve(item_id) else {
            return false;
        };
        self.state.lock().await.equipped.insert(slot, definition);
        true
    }
}

#[async_trait]
impl StateCollaborator for InventoryLedger {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn pull_current_state(&self) -> Result<CollaboratorReport> {
        let state = self.state.lock().await;
        let shared_equipment: EquipmentLoadout = state
            .equipped
            .iter()
            .map(|(slot, def)| (*slot, def.id.clone()))
            .collect();

        Ok(CollaboratorReport {
            source: Self::NAME.to_string(),
            inventory: Some(InventoryReport {
                currency: state.currency,
                items: state.items.clone(),
                shared_equipment,
            }),
            party: None,
        })
    }

    async fn push_loaded_state(&self, loaded: &GameState) -> Result<()> {
        let mut equipped = BTreeMap::new();
        for (slot, item_id) in &loaded.inventory.shared_equipment {
            match self.lookup.resolve(item_id) {
                Some(definition) => {
                    equipped.insert(*slot, definition);
                }
                None => log::warn!(
                    "inventory: saved equipment '{}' in {:?} no longer resolves, skipping",
                    item_id,
                    slot
                ),
            }
        }

        let mut state = self.state.lock().await;
        state.currency = loaded.inventory.currency;
        state.items = loaded.inventory.items.clone();
        state.equipped = equipped;
        Ok(())
    }

    async fn clear_all(&self) {
        *self.state.lock().await = LedgerState::default();
    }

    fn starting_loadout(&self) -> Vec<ItemStack> {
        self.seed.clone()
    }
}
