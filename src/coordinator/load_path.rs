impl SaveCoordinator {
    /// Load `slot` into the live state. Returns `false` instead of failing when there
    /// is no profile or the slot is missing or unreadable.
    pub async fn load(&self, slot: SlotNumber) -> bool {
        match self.try_load(slot).await {
            Ok(_) => true,
            Err(err) if err.is_missing_or_corrupt() => {
                event!(Level::WARN, slot, error = %err, "load found nothing usable");
                false
            }
            Err(err) => {
                event!(Level::WARN, slot, error = %err, "load refused");
                false
            }
        }
    }

    /// Load a manual slot, reporting why it could not be loaded.
    pub async fn try_load(&self, slot: SlotNumber) -> Result<LoadReceipt> {
        if slot < FIRST_MANUAL_SLOT || slot > self.inner.max_slot {
            return Err(PersistError::InvalidSlot(slot));
        }
        let mut session = self.inner.session.lock().await;
        session.sync_binding();
        self.load_locked(&mut session, slot).await
    }

    /// The only way to read slot 0.
    pub async fn load_autosave(&self) -> Result<LoadReceipt> {
        let mut session = self.inner.session.lock().await;
        session.sync_binding();
        self.load_locked(&mut session, AUTOSAVE_SLOT).await
    }

    /// Load the most recent save of the bound profile, unless a fresh game is already live.
    ///
    /// Sources are tried in order: the registry record, the last-slot hint, then the first
    /// occupied manual slot on disk. Returns the slot that was loaded, if any.
    pub async fn resume(&self) -> Result<Option<SlotNumber>> {
        let span = info_span!("coordinator.resume");
        async {
            let mut session = self.inner.session.lock().await;
            session.sync_binding();
            let binding = session.bound()?.clone();
            if session.state.as_ref().is_some_and(|state| state.is_new_game) {
                event!(Level::DEBUG, "fresh game is live, nothing to resume");
                return Ok(None);
            }

            let candidates = self.resume_candidates(&session, &binding).await?;
            for slot in candidates {
                match self.load_locked(&mut session, slot).await {
                    Ok(receipt) => {
                        event!(Level::INFO, slot = receipt.slot, "resumed");
                        return Ok(Some(receipt.slot));
                    }
                    Err(err) if err.is_missing_or_corrupt() => {
                        event!(Level::WARN, slot, error = %err, "resume candidate unusable");
                    }
                    Err(err) => return Err(err),
                }
            }
            Ok(None)
        }
        .instrument(span)
        .await
    }

    async fn resume_candidates(
        &self,
        session: &Session,
        binding: &Binding,
    ) -> Result<Vec<SlotNumber>> {
        let in_range = |slot: &SlotNumber| (FIRST_MANUAL_SLOT..=self.inner.max_slot).contains(slot);

        let (hint, record) = match binding.instance_id {
            Some(id) => {
                let hint = self.inner.preferences.lock().await.last_slot(id);
                let record = match &session.registry {
                    Some(registry) => registry.lock().await.instance(id).map(|p| p.last_save_slot),
                    None => None,
                };
                (hint.filter(in_range), record.filter(in_range))
            }
            None => (None, None),
        };

        if let (Some(hint), Some(record)) = (hint, record) {
            if hint != record {
                event!(Level::WARN, hint, record, "last-slot hint disagrees with registry record");
            }
        }

        let mut candidates = Vec::new();
        for slot in [record, hint].into_iter().flatten() {
            if !candidates.contains(&slot) && binding.store.exists(slot).await {
                candidates.push(slot);
            }
        }
        if let Some(first) = binding
            .store
            .occupied_slots()
            .await?
            .into_iter()
            .find(in_range)
        {
            if !candidates.contains(&first) {
                candidates.push(first);
            }
        }
        Ok(candidates)
    }

    async fn load_locked(&self, session: &mut Session, slot: SlotNumber) -> Result<LoadReceipt> {
        let store = session.bound()?.store.clone();
        let mut loaded = store.read(slot).await?;
        loaded.save_slot = slot;
        loaded.is_new_game = false;
        loaded.normalize();

        session.state = Some(loaded.clone());
        session.played_since = Instant::now();
        self.remember_slot(session, slot).await;

        let applied_by = self.inner.collaborators.push_all(&loaded).await;
        if session.binding_moved() {
            // The push may have landed after the switch cleared collaborators.
            self.inner.collaborators.clear_all().await;
            event!(Level::WARN, slot, "profile switched during load, collaborators cleared");
            return Err(PersistError::ProfileSwitched);
        }
        event!(Level::INFO, slot, applied_by, "slot loaded");
        Ok(LoadReceipt {
            slot,
            path: store.path(slot),
            applied_by,
        })
    }

    /// Whether `slot` has a file for the bound profile.
    pub async fn exists(&self, slot: SlotNumber) -> bool {
        let mut session = self.inner.session.lock().await;
        session.sync_binding();
        match session.binding.as_ref() {
            Some(binding) => binding.store.exists(slot).await,
            None => false,
        }
    }

    /// Remove a slot file. Returns `false` when there was nothing to remove.
    pub async fn delete(&self, slot: SlotNumber) -> Result<bool> {
        let mut session = self.inner.session.lock().await;
        session.sync_binding();
        let Some(binding) = session.binding.as_ref() else {
            return Ok(false);
        };
        let removed = binding.store.delete(slot).await?;

        if let Some(id) = binding.instance_id {
            let mut preferences = self.inner.preferences.lock().await;
            if removed && preferences.last_slot(id) == Some(slot) {
                preferences.clear_last_slot(id).await?;
            }
        }
        Ok(removed)
    }
}
