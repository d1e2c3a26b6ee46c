impl SaveCoordinator {
    /// Create an unbound coordinator. It has no profile until a registry is attached
    /// or legacy mode is bound.
    pub fn new(
        config: &PersistenceConfig,
        collaborators: CollaboratorSet,
        preferences: SharedPreferences,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                collaborators,
                preferences,
                max_slot: config.slots.max_slot,
                vehicle_tolerance: config.repair.vehicle_tolerance,
                saving: AtomicBool::new(false),
                session: Mutex::new(Session {
                    registry: None,
                    binding_rx: None,
                    binding: None,
                    state: None,
                    played_since: Instant::now(),
                }),
            }),
        }
    }

    /// Follow `registry` from now on, binding whatever it currently has active.
    pub async fn attach_registry(&self, registry: Arc<Mutex<InstanceRegistry>>) {
        let mut rx = registry.lock().await.subscribe();
        let current = rx.borrow_and_update().as_ref().map(Binding::from_instance);

        let mut session = self.inner.session.lock().await;
        session.registry = Some(registry);
        session.binding_rx = Some(rx);
        session.rebind(current);
    }

    /// Single-profile mode rooted at `root`, used when no registry came up.
    pub async fn bind_legacy(&self, root: impl Into<PathBuf>, format: crate::storage::SlotFormat) {
        let store = SlotStore::new(ProfileLayout::new(root, format));
        event!(
            Level::WARN,
            root = %store.layout().root().display(),
            "coordinator bound to legacy root"
        );

        let mut session = self.inner.session.lock().await;
        session.registry = None;
        session.binding_rx = None;
        session.rebind(Some(Binding {
            instance_id: None,
            store,
        }));
    }

    pub async fn has_active_profile(&self) -> bool {
        let mut session = self.inner.session.lock().await;
        session.sync_binding();
        session.binding.is_some()
    }

    /// Bound profile id. `None` when unbound or in legacy mode.
    pub async fn active_instance_id(&self) -> Option<InstanceId> {
        let mut session = self.inner.session.lock().await;
        session.sync_binding();
        session.binding.as_ref().and_then(|b| b.instance_id)
    }

    pub async fn is_legacy(&self) -> bool {
        let session = self.inner.session.lock().await;
        session
            .binding
            .as_ref()
            .is_some_and(|b| b.instance_id.is_none())
    }

    /// Copy of the live state, if one is loaded for the bound profile.
    pub async fn active_state(&self) -> Option<GameState> {
        let mut session = self.inner.session.lock().await;
        session.sync_binding();
        session.state.clone()
    }

    pub fn collaborators(&self) -> &CollaboratorSet {
        &self.inner.collaborators
    }

    pub fn max_slot(&self) -> SlotNumber {
        self.inner.max_slot
    }

    /// Install a freshly seeded game as the live state and hand it to collaborators.
    pub async fn start_new_game(&self, mut state: GameState) -> Result<()> {
        let mut session = self.inner.session.lock().await;
        session.sync_binding();
        session.bound()?;

        state.is_new_game = true;
        state.normalize();
        let applied = self.inner.collaborators.push_all(&state).await;
        if session.binding_moved() {
            self.inner.collaborators.clear_all().await;
            return Err(PersistError::ProfileSwitched);
        }
        event!(Level::INFO, applied, "new game installed");

        session.state = Some(state);
        session.played_since = Instant::now();
        Ok(())
    }

    /// Record the slot most recently written or read, in the hint and the registry.
    async fn remember_slot(&self, session: &Session, slot: SlotNumber) {
        if slot < FIRST_MANUAL_SLOT || slot > self.inner.max_slot {
            return;
        }
        let Some(id) = session.binding.as_ref().and_then(|b| b.instance_id) else {
            return;
        };

        if let Err(err) = self.inner.preferences.lock().await.set_last_slot(id, slot).await {
            event!(Level::WARN, error = %err, "failed to write last-slot hint");
        }
        if let Some(registry) = &session.registry {
            if let Err(err) = registry.lock().await.update_last_save_slot(id, slot).await {
                event!(Level::ERROR, error = %err, "failed to record last save slot");
            }
        }
    }
}
