use crate::core::Vec3;
use serde::{Deserialize, Serialize};

/// Boat state. The player may be aboard, in which case both positions must agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleState {
    pub vehicle_id: Option<String>,
    pub is_aboard: bool,
    pub position: Vec3,
    pub rotation_y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerData {
    pub name: String,
    pub position: Vec3,
    pub rotation_y: f32,
    pub health: f32,
    pub max_health: f32,
    pub mana: f32,
    pub max_mana: f32,
    pub level: u32,
    pub experience: u64,
    pub vehicle: VehicleState,
}

impl Default for PlayerData {
    fn default() -> Self {
        Self {
            name: String::new(),
            position: Vec3::ZERO,
            rotation_y: 0.0,
            health: 100.0,
            max_health: 100.0,
            mana: 50.0,
            max_mana: 50.0,
            level: 1,
            experience: 0,
            vehicle: VehicleState::default(),
        }
    }
}

impl PlayerData {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Distance between the player and the boat they claim to be aboard.
    /// `None` when the player is not aboard anything.
    pub fn vehicle_offset(&self) -> Option<f32> {
        if !self.vehicle.is_aboard {
            return None;
        }
        Some(self.position.distance(&self.vehicle.position))
    }

    /// Keep current values inside their caps after the caps change.
    pub fn clamp_vitals(&mut self) {
        self.max_health = self.max_health.max(1.0);
        self.max_mana = self.max_mana.max(0.0);
        self.health = self.health.clamp(0.0, self.max_health);
        self.mana = self.mana.clamp(0.0, self.max_mana);
    }
}
