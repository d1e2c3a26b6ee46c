use crate::core::Vec3;
use crate::state::GameState;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;

pub type ActorId = String;

pub const PLAYER_ACTOR: &str = "player";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationMode {
    Dynamic,
    Kinematic,
    Static,
}

/// Physics-owning side of scene entry. The core only decides ordering.
#[async_trait]
pub trait ActorPlacement: Send + Sync {
    /// Current mode, or `None` if the actor does not exist in the scene.
    async fn simulation_mode(&self, actor: &str) -> Option<SimulationMode>;
    async fn set_simulation_mode(&self, actor: &str, mode: SimulationMode);
    async fn set_transform(&self, actor: &str, position: Vec3, rotation_y: f32);
    /// Resolves once the actor has stopped reacting to the overwrite.
    async fn await_settled(&self, actor: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRequest {
    pub actor: ActorId,
    pub position: Vec3,
    pub rotation_y: f32,
}

impl PlacementRequest {
    /// Actors whose positions a loaded state dictates. The vehicle comes first so a
    /// boarded player is placed onto an already positioned boat.
    pub fn from_state(state: &GameState) -> Vec<PlacementRequest> {
        let mut requests = Vec::with_capacity(2);
        if let Some(vehicle_id) = &state.player.vehicle.vehicle_id {
            requests.push(PlacementRequest {
                actor: vehicle_id.clone(),
                position: state.player.vehicle.position,
                rotation_y: state.player.vehicle.rotation_y,
            });
        }
        requests.push(PlacementRequest {
            actor: PLAYER_ACTOR.to_string(),
            position: state.player.position,
            rotation_y: state.player.rotation_y,
        });
        requests
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementReport {
    pub placed: Vec<ActorId>,
    pub missing: Vec<ActorId>,
    pub unsettled: Vec<ActorId>,
}

/// Freeze every actor, write all positions, wait for each to settle, then restore modes.
///
/// No actor resumes simulation before every position has been written.
pub async fn place_actors(
    placement: &dyn ActorPlacement,
    requests: &[PlacementRequest],
    settle_wait: Duration,
) -> PlacementReport {
    let mut report = PlacementReport::default();
    let mut frozen: Vec<(&PlacementRequest, SimulationMode)> = Vec::with_capacity(requests.len());

    for request in requests {
        match placement.simulation_mode(&request.actor).await {
            Some(prior) => {
                placement
                    .set_simulation_mode(&request.actor, SimulationMode::Kinematic)
                    .await;
                frozen.push((request, prior));
            }
            None => {
                log::warn!("placement: actor '{}' not in scene, skipping", request.actor);
                report.missing.push(request.actor.clone());
            }
        }
    }

    for (request, _) in &frozen {
        placement
            .set_transform(&request.actor, request.position, request.rotation_y)
            .await;
    }

    for (request, _) in &frozen {
        if timeout(settle_wait, placement.await_settled(&request.actor))
            .await
            .is_err()
        {
            log::warn!(
                "placement: actor '{}' did not settle within {:?}",
                request.actor,
                settle_wait
            );
            report.unsettled.push(request.actor.clone());
        }
    }

    for (request, prior) in frozen {
        placement.set_simulation_mode(&request.actor, prior).await;
        report.placed.push(request.actor.clone());
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Difficulty;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Mode(String, SimulationMode),
        Transform(String),
        Settled(String),
    }

    struct Recorder {
        modes: Mutex<HashMap<String, SimulationMode>>,
        calls: Mutex<Vec<Call>>,
        never_settles: Option<String>,
    }

    impl Recorder {
        fn new(actors: &[(&str, SimulationMode)]) -> Self {
            Self {
                modes: Mutex::new(
                    actors
                        .iter()
                        .map(|(name, mode)| (name.to_string(), *mode))
                        .collect(),
                ),
                calls: Mutex::new(Vec::new()),
                never_settles: None,
            }
        }
    }

    #[async_trait]
    impl ActorPlacement for Recorder {
        async fn simulation_mode(&self, actor: &str) -> Option<SimulationMode> {
            self.modes.lock().await.get(actor).copied()
        }

        async fn set_simulation_mode(&self, actor: &str, mode: SimulationMode) {
            self.modes.lock().await.insert(actor.to_string(), mode);
            self.calls
                .lock()
                .await
                .push(Call::Mode(actor.to_string(), mode));
        }

        async fn set_transform(&self, actor: &str, _position: Vec3, _rotation_y: f32) {
            self.calls
                .lock()
                .await
                .push(Call::Transform(actor.to_string()));
        }

        async fn await_settled(&self, actor: &str) {
            if self.never_settles.as_deref() == Some(actor) {
                std::future::pending::<()>().await;
            }
            self.calls
                .lock()
                .await
                .push(Call::Settled(actor.to_string()));
        }
    }

    fn boarded_state() -> GameState {
        let mut state = GameState::new_game("Ada", Difficulty::Normal, Vec::new());
        state.player.vehicle.vehicle_id = Some("boat".to_string());
        state.player.vehicle.is_aboard = true;
        state
    }

    #[tokio::test]
    async fn test_freeze_write_restore_order() {
        let recorder = Recorder::new(&[
            ("player", SimulationMode::Dynamic),
            ("boat", SimulationMode::Dynamic),
        ]);
        let requests = PlacementRequest::from_state(&boarded_state());

        let report = place_actors(&recorder, &requests, Duration::from_millis(50)).await;

        assert_eq!(report.placed, vec!["boat".to_string(), "player".to_string()]);
        let calls = recorder.calls.lock().await.clone();
        assert_eq!(
            calls,
            vec![
                Call::Mode("boat".into(), SimulationMode::Kinematic),
                Call::Mode("player".into(), SimulationMode::Kinematic),
                Call::Transform("boat".into()),
                Call::Transform("player".into()),
                Call::Settled("boat".into()),
                Call::Settled("player".into()),
                Call::Mode("boat".into(), SimulationMode::Dynamic),
                Call::Mode("player".into(), SimulationMode::Dynamic),
            ]
        );
    }

    #[tokio::test]
    async fn test_unsettled_actor_still_restored() {
        let mut recorder = Recorder::new(&[("player", SimulationMode::Static)]);
        recorder.never_settles = Some("player".to_string());
        let requests = PlacementRequest::from_state(&GameState::default());

        let report = place_actors(&recorder, &requests, Duration::from_millis(10)).await;

        assert_eq!(report.unsettled, vec!["player".to_string()]);
        assert_eq!(
            recorder.modes.lock().await.get("player"),
            Some(&SimulationMode::Static)
        );
    }

    #[tokio::test]
    async fn test_missing_actor_is_reported() {
        let recorder = Recorder::new(&[("player", SimulationMode::Dynamic)]);
        let requests = PlacementRequest::from_state(&boarded_state());

        let report = place_actors(&recorder, &requests, Duration::from_millis(10)).await;

        assert_eq!(report.missing, vec!["boat".to_string()]);
        assert_eq!(report.placed, vec!["player".to_string()]);
    }
}
