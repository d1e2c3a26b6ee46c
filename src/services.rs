//! Explicit wiring of the persistence services for one process.

use crate::bootstrap::ReadySignal;
use crate::collab::{ActorPlacement, CollaboratorSet, StateCollaborator};
use crate::config::PersistenceConfig;
use crate::coordinator::SaveCoordinator;
use crate::core::Result;
use crate::registry::InstanceRegistry;
use crate::storage::{PreferenceStore, SharedPreferences};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

pub type SharedRegistry = Arc<Mutex<InstanceRegistry>>;

/// Holds the configuration, the collaborators and a readiness signal per service.
///
/// Services are started independently; consumers wait on the signals with a bound.
#[derive(Clone)]
pub struct ServiceContainer {
    config: PersistenceConfig,
    collaborators: CollaboratorSet,
    placement: Option<Arc<dyn ActorPlacement>>,
    preferences: Arc<OnceCell<SharedPreferences>>,
    registry: ReadySignal<SharedRegistry>,
    coordinator: ReadySignal<SaveCoordinator>,
}

impl ServiceContainer {
    pub fn new(config: PersistenceConfig) -> Self {
        Self {
            config: config.normalized(),
            collaborators: CollaboratorSet::new(),
            placement: None,
            preferences: Arc::new(OnceCell::new()),
            registry: ReadySignal::new(),
            coordinator: ReadySignal::new(),
        }
    }

    pub fn with_collaborator(mut self, collaborator: Arc<dyn StateCollaborator>) -> Self {
        self.collaborators.register(collaborator);
        self
    }

    pub fn with_placement(mut self, placement: Arc<dyn ActorPlacement>) -> Self {
        self.placement = Some(placement);
        self
    }

    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    pub fn collaborators(&self) -> &CollaboratorSet {
        &self.collaborators
    }

    pub fn placement(&self) -> Option<&Arc<dyn ActorPlacement>> {
        self.placement.as_ref()
    }

    pub fn registry(&self) -> &ReadySignal<SharedRegistry> {
        &self.registry
    }

    pub fn coordinator(&self) -> &ReadySignal<SaveCoordinator> {
        &self.coordinator
    }

    /// The process-wide hint store, opened on first use.
    pub async fn preferences(&self) -> Result<SharedPreferences> {
        let preferences = self
            .preferences
            .get_or_try_init(|| async {
                PreferenceStore::open(self.config.preferences_path())
                    .await
                    .map(PreferenceStore::shared)
            })
            .await?;
        Ok(preferences.clone())
    }

    /// Open the instance registry and publish it.
    pub async fn start_registry(&self) -> Result<SharedRegistry> {
        let registry = InstanceRegistry::open(&self.config, self.collaborators.clone())
            .await?
            .with_preferences(self.preferences().await?);
        let registry = Arc::new(Mutex::new(registry));
        self.registry.publish(registry.clone());
        log::info!(
            "instance registry ready at '{}'",
            self.config.instances_dir().display()
        );
        Ok(registry)
    }

    /// Open the preference store, build the coordinator and publish it unbound.
    pub async fn start_coordinator(&self) -> Result<SaveCoordinator> {
        let preferences = self.preferences().await?;
        let coordinator =
            SaveCoordinator::new(&self.config, self.collaborators.clone(), preferences);
        self.coordinator.publish(coordinator.clone());
        log::info!("save coordinator ready");
        Ok(coordinator)
    }

    pub async fn start_all(&self) -> Result<()> {
        self.start_registry().await?;
        self.start_coordinator().await?;
        Ok(())
    }
}
