impl SaveCoordinator {
    /// Explicit save into `slot`. Slot 0 is reserved for autosave and is written as slot 1.
    ///
    /// Runs pull, merge, write and sync-back in that order. On failure the live state is
    /// left exactly as it was.
    pub async fn save(&self, slot: SlotNumber) -> Result<SaveReceipt> {
        let slot = if slot == AUTOSAVE_SLOT {
            event!(Level::WARN, "explicit save to autosave slot redirected to slot 1");
            FIRST_MANUAL_SLOT
        } else {
            slot
        };
        if slot > self.inner.max_slot {
            return Err(PersistError::InvalidSlot(slot));
        }
        self.save_with(slot, false).await
    }

    /// Autosave into slot 0. Every failure is logged and swallowed.
    pub async fn autosave(&self) -> Option<SaveReceipt> {
        match self.save_with(AUTOSAVE_SLOT, true).await {
            Ok(receipt) => Some(receipt),
            Err(PersistError::NoActiveProfile) | Err(PersistError::NoLiveState) => {
                event!(Level::DEBUG, "autosave skipped: nothing to save");
                None
            }
            Err(PersistError::SaveInProgress) => {
                event!(Level::INFO, "autosave skipped: another save is in flight");
                None
            }
            Err(PersistError::ProfileSwitched) => {
                event!(Level::INFO, "autosave discarded: profile switched mid-save");
                None
            }
            Err(err) => {
                event!(Level::WARN, error = %err, "autosave failed");
                None
            }
        }
    }

    async fn save_with(&self, slot: SlotNumber, autosave: bool) -> Result<SaveReceipt> {
        let Some(_in_flight) = InFlight::acquire(&self.inner.saving) else {
            return Err(PersistError::SaveInProgress);
        };

        let span = info_span!("coordinator.save", slot, autosave);
        async {
            let mut session = self.inner.session.lock().await;
            session.sync_binding();
            let store = session.bound()?.store.clone();
            if session.state.is_none() {
                return Err(PersistError::NoLiveState);
            }

            let reports = self.inner.collaborators.pull_all().await;
            if session.binding_moved() {
                event!(Level::WARN, "profile switched during pull, snapshot discarded");
                return Err(PersistError::ProfileSwitched);
            }

            let Some(live) = session.state.as_ref() else {
                return Err(PersistError::NoLiveState);
            };
            let mut snapshot = live.clone();
            for report in &reports {
                report.merge_into(&mut snapshot);
            }
            let saved_at = Utc::now();
            snapshot.stamp(slot, saved_at);
            snapshot.normalize();

            let bytes_written = match store.write(slot, &snapshot).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    event!(Level::ERROR, error = %err, "slot write failed, live state kept");
                    return Err(err);
                }
            };
            event!(Level::INFO, bytes_written, pulled = reports.len(), "slot written");

            if !autosave {
                if let Some(live) = session.state.as_mut() {
                    live.accept_saved_fields(&snapshot);
                }
                self.remember_slot(&session, slot).await;
                self.record_play_time(&mut session).await;
            }

            Ok(SaveReceipt {
                slot,
                path: store.path(slot),
                bytes_written,
                saved_at,
                autosave,
            })
        }
        .instrument(span)
        .await
    }

    async fn record_play_time(&self, session: &mut Session) {
        let elapsed = session.played_since.elapsed();
        session.played_since = Instant::now();
        let (Some(registry), Some(id)) = (
            session.registry.as_ref(),
            session.binding.as_ref().and_then(|b| b.instance_id),
        ) else {
            return;
        };
        let hours = elapsed.as_secs_f64() / 3600.0;
        if let Err(err) = registry.lock().await.add_play_time(id, hours).await {
            event!(Level::WARN, error = %err, "failed to record play time");
        }
    }
}
