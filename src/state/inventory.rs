use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Equipment slots shared by the player loadout and party members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EquipmentSlot {
    Head,
    Body,
    MainHand,
    OffHand,
    Accessory,
}

/// Equipment slot -> item identifier. Identifiers are resolved back to items on load.
pub type EquipmentLoadout = BTreeMap<EquipmentSlot, String>;

/// One inventory record. Non-stackable items always carry quantity 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub item_id: String,
    pub quantity: u32,
    #[serde(default = "default_stackable")]
    pub stackable: bool,
}

fn default_stackable() -> bool {
    true
}

impl ItemRecord {
    pub fn stack(item_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
            stackable: true,
        }
    }

    pub fn single(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            quantity: 1,
            stackable: false,
        }
    }
}

/// Seed entry a collaborator contributes to a new game.
pub type ItemStack = ItemRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryData {
    pub currency: u64,
    pub items: Vec<ItemRecord>,
    pub shared_equipment: EquipmentLoadout,
}

impl InventoryData {
    pub fn quantity_of(&self, item_id: &str) -> u32 {
        self.items
            .iter()
            .filter(|item| item.item_id == item_id)
            .map(|item| item.quantity)
            .sum()
    }

    /// Drop empty records, force non-stackables to quantity 1 and fold duplicate stacks.
    pub fn normalize(&mut self) {
        let mut merged: Vec<ItemRecord> = Vec::with_capacity(self.items.len());
        for mut item in self.items.drain(..) {
            if item.quantity == 0 || item.item_id.is_empty() {
                continue;
            }
            if !item.stackable {
                item.quantity = 1;
                merged.push(item);
                continue;
            }
            match merged
                .iter_mut()
                .find(|existing| existing.stackable && existing.item_id == item.item_id)
            {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity)
                }
                None => merged.push(item),
            }
        }
        self.items = merged;
        self.shared_equipment.retain(|_, item_id| !item_id.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_stacks_and_drops_empties() {
        let mut inventory = InventoryData {
            currency: 10,
            items: vec![
                ItemRecord::stack("potion", 2),
                ItemRecord::single("sword"),
                ItemRecord::stack("potion", 3),
                ItemRecord::stack("arrow", 0),
                ItemRecord {
                    item_id: "shield".to_string(),
                    quantity: 4,
                    stackable: false,
                },
            ],
            shared_equipment: EquipmentLoadout::new(),
        };

        inventory.normalize();

        assert_eq!(inventory.items.len(), 3);
        assert_eq!(inventory.quantity_of("potion"), 5);
        assert_eq!(inventory.quantity_of("arrow"), 0);
        assert_eq!(inventory.quantity_of("shield"), 1);
    }
}
