use crate::state::EquipmentSlot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Concrete item an identifier resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub id: String,
    pub name: String,
    pub stackable: bool,
    #[serde(default)]
    pub equip_slot: Option<EquipmentSlot>,
}

impl ItemDefinition {
    pub fn consumable(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stackable: true,
            equip_slot: None,
        }
    }

    pub fn equipment(id: impl Into<String>, name: impl Into<String>, slot: EquipmentSlot) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stackable: false,
            equip_slot: Some(slot),
        }
    }
}

/// Resolves saved item identifiers back into item definitions.
pub trait ItemLookup: Send + Sync {
    fn resolve(&self, item_id: &str) -> Option<ItemDefinition>;
}

/// In-memory item lookup keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: HashMap<String, ItemDefinition>,
}

impl ItemCatalog {
    pub fn from_definitions(definitions: impl IntoIterator<Item = ItemDefinition>) -> Self {
        Self {
            items: definitions
                .into_iter()
                .map(|def| (def.id.clone(), def))
                .collect(),
        }
    }

    pub fn insert(&mut self, definition: ItemDefinition) {
        self.items.insert(definition.id.clone(), definition);
    }

    pub fn remove(&mut self, item_id: &str) -> Option<ItemDefinition> {
        self.items.remove(item_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ItemLookup for ItemCatalog {
    fn resolve(&self, item_id: &str) -> Option<ItemDefinition> {
        self.items.get(item_id).cloned()
    }
}
