//! Startup sequencing: wait for services, pick a profile, get a live state, place actors.

use crate::collab::{PlacementReport, PlacementRequest, place_actors};
use crate::coordinator::SaveCoordinator;
use crate::core::{Difficulty, FIRST_MANUAL_SLOT, InstanceId, PersistError, Result, SlotNumber};
use crate::services::{ServiceContainer, SharedRegistry};
use crate::state::GameState;
use std::fmt;
use tracing::{Instrument, Level, event, info_span};

pub mod autosave;
pub mod readiness;

pub use autosave::{AutosaveWorker, spawn_autosave_every, spawn_autosave_worker};
pub use readiness::ReadySignal;

/// How the next session should start.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StartupMode {
    /// Create a new profile. `None` uses the configured default name.
    NewGame {
        name: Option<String>,
        difficulty: Difficulty,
    },
    #[default]
    Continue,
    LoadSpecific(SlotNumber),
}

impl fmt::Display for StartupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupMode::NewGame { .. } => write!(f, "new-game"),
            StartupMode::Continue => write!(f, "continue"),
            StartupMode::LoadSpecific(slot) => write!(f, "load-slot-{}", slot),
        }
    }
}

/// How the requested mode was actually satisfied.
#[derive(Debug, Clone, PartialEq)]
pub enum StartupOutcome {
    /// A new game was seeded and its first save written.
    NewGame,
    /// An existing save was resumed.
    Resumed(SlotNumber),
    /// A specific slot was loaded.
    Loaded(SlotNumber),
    /// The profile had nothing loadable; a fresh game was started in it.
    FreshGame,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartupReport {
    pub requested: StartupMode,
    pub outcome: StartupOutcome,
    pub instance_id: Option<InstanceId>,
    pub legacy: bool,
    pub placement: Option<PlacementReport>,
}

/// Runs the startup sequence once per requested mode.
pub struct BootstrapSequencer {
    services: ServiceContainer,
    pending: Option<StartupMode>,
}

impl BootstrapSequencer {
    pub fn new(services: ServiceContainer) -> Self {
        Self {
            services,
            pending: None,
        }
    }

    /// Choose the mode for the next `run`. A later request replaces an earlier one.
    pub fn request(&mut self, mode: StartupMode) {
        self.pending = Some(mode);
    }

    pub fn pending(&self) -> Option<&StartupMode> {
        self.pending.as_ref()
    }

    /// Bring the session up. The requested mode is consumed; the next run defaults to
    /// `Continue`.
    pub async fn run(&mut self) -> Result<StartupReport> {
        let mode = self.pending.take().unwrap_or_default();
        let span = info_span!("bootstrap.run", mode = %mode);
        self.run_mode(mode).instrument(span).await
    }

    async fn run_mode(&self, mode: StartupMode) -> Result<StartupReport> {
        let startup = &self.services.config().startup;

        let registry = self.services.registry().wait(startup.registry_wait()).await;
        if registry.is_none() {
            event!(
                Level::WARN,
                wait_ms = startup.registry_wait_ms,
                "instance registry unavailable, using legacy profile"
            );
        }

        let coordinator = self
            .services
            .coordinator()
            .wait(startup.coordinator_wait())
            .await
            .ok_or_else(|| {
                event!(Level::ERROR, "save coordinator unavailable, aborting startup");
                PersistError::ServiceUnavailable("save coordinator")
            })?;

        let (outcome, legacy) = match registry {
            Some(registry) => {
                coordinator.attach_registry(registry.clone()).await;
                let outcome = self.dispatch(&mode, &registry, &coordinator).await?;
                (outcome, false)
            }
            None => {
                let config = self.services.config();
                coordinator
                    .bind_legacy(config.legacy_root(), config.slots.format)
                    .await;
                (self.dispatch_legacy(&mode, &coordinator).await?, true)
            }
        };

        let placement = self.hand_off_placement(&coordinator).await;
        let report = StartupReport {
            requested: mode,
            outcome,
            instance_id: coordinator.active_instance_id().await,
            legacy,
            placement,
        };
        event!(
            Level::INFO,
            outcome = ?report.outcome,
            instance = ?report.instance_id,
            "startup complete"
        );
        Ok(report)
    }

    async fn dispatch(
        &self,
        mode: &StartupMode,
        registry: &SharedRegistry,
        coordinator: &SaveCoordinator,
    ) -> Result<StartupOutcome> {
        match mode {
            StartupMode::NewGame { name, difficulty } => {
                self.new_profile(name.as_deref(), *difficulty, registry, coordinator)
                    .await
            }
            StartupMode::Continue => {
                let Some(id) = self.select_target(registry).await? else {
                    event!(Level::INFO, "no profiles yet, starting a new game");
                    return self
                        .new_profile(None, Difficulty::default(), registry, coordinator)
                        .await;
                };
                match coordinator.resume().await {
                    Ok(Some(slot)) => Ok(StartupOutcome::Resumed(slot)),
                    Ok(None) => self.fresh_game(id, registry, coordinator).await,
                    Err(err) => {
                        event!(Level::WARN, error = %err, "resume failed, starting fresh");
                        self.fresh_game(id, registry, coordinator).await
                    }
                }
            }
            StartupMode::LoadSpecific(slot) => {
                if self.select_target(registry).await?.is_some() && coordinator.load(*slot).await
                {
                    return Ok(StartupOutcome::Loaded(*slot));
                }
                event!(Level::WARN, slot, "requested slot unavailable, starting a new game");
                self.new_profile(None, Difficulty::default(), registry, coordinator)
                    .await
            }
        }
    }

    async fn dispatch_legacy(
        &self,
        mode: &StartupMode,
        coordinator: &SaveCoordinator,
    ) -> Result<StartupOutcome> {
        let loaded = match mode {
            StartupMode::NewGame { .. } => None,
            StartupMode::Continue => coordinator.resume().await.unwrap_or_else(|err| {
                event!(Level::WARN, error = %err, "legacy resume failed");
                None
            }),
            StartupMode::LoadSpecific(slot) => coordinator.load(*slot).await.then_some(*slot),
        };

        match (mode, loaded) {
            (StartupMode::Continue, Some(slot)) => Ok(StartupOutcome::Resumed(slot)),
            (StartupMode::LoadSpecific(_), Some(slot)) => Ok(StartupOutcome::Loaded(slot)),
            _ => {
                let (name, difficulty) = match mode {
                    StartupMode::NewGame { name, difficulty } => (name.clone(), *difficulty),
                    _ => (None, Difficulty::default()),
                };
                let name = name.unwrap_or_else(|| self.default_name());
                self.seed_and_save(&name, difficulty, coordinator).await?;
                Ok(StartupOutcome::NewGame)
            }
        }
    }

    /// Select the active profile, or the first one. `None` when there are no profiles.
    async fn select_target(&self, registry: &SharedRegistry) -> Result<Option<InstanceId>> {
        let selected = {
            let mut registry = registry.lock().await;
            let target = registry
                .active_id()
                .or_else(|| registry.list_instances().first().map(|p| p.id));
            match target {
                Some(id) => registry.select_instance(id).await?.then_some(id),
                None => None,
            }
        };
        if selected.is_some() {
            self.settle_after_switch().await;
        }
        Ok(selected)
    }

    async fn new_profile(
        &self,
        name: Option<&str>,
        difficulty: Difficulty,
        registry: &SharedRegistry,
        coordinator: &SaveCoordinator,
    ) -> Result<StartupOutcome> {
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| self.default_name());
        {
            let mut registry = registry.lock().await;
            if !registry.can_create_instance() {
                return Err(PersistError::InstanceLimitReached(registry.max_instances()));
            }
            registry.create_instance(&name, difficulty).await?;
        }
        self.settle_after_switch().await;
        self.seed_and_save(&name, difficulty, coordinator).await?;
        Ok(StartupOutcome::NewGame)
    }

    async fn fresh_game(
        &self,
        id: InstanceId,
        registry: &SharedRegistry,
        coordinator: &SaveCoordinator,
    ) -> Result<StartupOutcome> {
        let (name, difficulty) = {
            let registry = registry.lock().await;
            let profile = registry
                .instance(id)
                .ok_or(PersistError::UnknownInstance(id))?;
            (profile.name.clone(), profile.difficulty)
        };
        self.seed_and_save(&name, difficulty, coordinator).await?;
        Ok(StartupOutcome::FreshGame)
    }

    async fn seed_and_save(
        &self,
        name: &str,
        difficulty: Difficulty,
        coordinator: &SaveCoordinator,
    ) -> Result<()> {
        let loadout = self.services.collaborators().starting_loadout();
        let state = GameState::new_game(name, difficulty, loadout);
        coordinator.start_new_game(state).await?;
        coordinator.save(FIRST_MANUAL_SLOT).await?;
        Ok(())
    }

    /// Give collaborators the configured number of scheduler turns to finish reacting
    /// to a profile switch.
    async fn settle_after_switch(&self) {
        for _ in 0..self.services.config().startup.profile_switch_ticks {
            tokio::task::yield_now().await;
        }
    }

    async fn hand_off_placement(&self, coordinator: &SaveCoordinator) -> Option<PlacementReport> {
        let placement = self.services.placement()?;
        let state = coordinator.active_state().await?;
        let requests = PlacementRequest::from_state(&state);
        let settle_wait = self.services.config().startup.settle_wait();
        Some(place_actors(placement.as_ref(), &requests, settle_wait).await)
    }

    fn default_name(&self) -> String {
        self.services.config().startup.default_profile_name.clone()
    }
}
