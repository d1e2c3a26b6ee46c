use super::inventory::EquipmentLoadout;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyMember {
    pub character_id: String,
    pub display_name: String,
    #[serde(default = "default_level")]
    pub level: u32,
    pub hp: f32,
    pub max_hp: f32,
    pub mp: f32,
    pub max_mp: f32,
    #[serde(default)]
    pub equipment: EquipmentLoadout,
}

fn default_level() -> u32 {
    1
}

impl PartyMember {
    pub fn new(character_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
            display_name: display_name.into(),
            level: 1,
            hp: 100.0,
            max_hp: 100.0,
            mp: 50.0,
            max_mp: 50.0,
            equipment: EquipmentLoadout::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PartyData {
    pub active_index: usize,
    pub members: Vec<PartyMember>,
}

impl PartyData {
    pub fn active_member(&self) -> Option<&PartyMember> {
        self.members.get(self.active_index)
    }

    pub fn normalize(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.members
            .retain(|member| seen.insert(member.character_id.clone()));
        for member in &mut self.members {
            member.max_hp = member.max_hp.max(1.0);
            member.max_mp = member.max_mp.max(0.0);
            member.hp = member.hp.clamp(0.0, member.max_hp);
            member.mp = member.mp.clamp(0.0, member.max_mp);
            member.equipment.retain(|_, item_id| !item_id.is_empty());
        }
        if self.active_index >= self.members.len() {
            self.active_index = 0;
        }
    }
}
