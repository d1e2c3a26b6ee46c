use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefeatedEnemy {
    pub enemy_id: String,
    pub defeated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestProgress {
    pub quest_id: String,
    pub stage: u32,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct WorldData {
    pub defeated_enemies: Vec<DefeatedEnemy>,
    pub collected_items: Vec<String>,
    pub quest_progress: Vec<QuestProgress>,
}

impl WorldData {
    pub fn is_enemy_defeated(&self, enemy_id: &str) -> bool {
        self.defeated_enemies
            .iter()
            .any(|enemy| enemy.enemy_id == enemy_id)
    }

    /// Keep the first record per enemy/item and the furthest stage per quest.
    pub fn normalize(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.defeated_enemies
            .retain(|enemy| seen.insert(enemy.enemy_id.clone()));

        let mut seen = std::collections::HashSet::new();
        self.collected_items.retain(|item| seen.insert(item.clone()));

        let mut merged: Vec<QuestProgress> = Vec::with_capacity(self.quest_progress.len());
        for quest in self.quest_progress.drain(..) {
            match merged.iter_mut().find(|q| q.quest_id == quest.quest_id) {
                Some(existing) => {
                    existing.stage = existing.stage.max(quest.stage);
                    existing.completed |= quest.completed;
                }
                None => merged.push(quest),
            }
        }
        self.quest_progress = merged;
    }
}
