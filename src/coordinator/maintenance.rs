impl SaveCoordinator {
    /// Every slot file of the bound profile, ascending, with what a load screen shows.
    pub async fn list_slots(&self) -> Result<Vec<SlotSummary>> {
        let mut session = self.inner.session.lock().await;
        session.sync_binding();
        let store = session.bound()?.store.clone();
        drop(session);

        let mut summaries = Vec::new();
        for slot in store.occupied_slots().await? {
            let status = match store.read(slot).await {
                Ok(state) => SlotStatus::Readable {
                    player_name: state.player.name,
                    level: state.player.level,
                    currency: state.inventory.currency,
                    saved_at: state.save_date,
                },
                Err(err) => SlotStatus::Unreadable(err.to_string()),
            };
            summaries.push(SlotSummary { slot, status });
        }
        Ok(summaries)
    }

    /// Walk the bound profile's slots and fix what can be fixed.
    ///
    /// Undecodable files and saves where the player is farther from their vehicle than the
    /// configured tolerance are deleted. Files whose stored slot number disagrees with
    /// their file name are rewritten in place.
    pub async fn repair_scan(&self) -> Result<RepairReport> {
        let span = info_span!("coordinator.repair");
        async {
            let mut session = self.inner.session.lock().await;
            session.sync_binding();
            let store = session.bound()?.store.clone();

            let mut report = RepairReport::default();
            for slot in store.occupied_slots().await? {
                report.scanned += 1;
                let mut state = match store.read(slot).await {
                    Ok(state) => state,
                    Err(err @ PersistError::Deserialization { .. }) => {
                        event!(Level::WARN, slot, error = %err, "removing undecodable slot");
                        store.delete(slot).await?;
                        report.removed_undecodable.push(slot);
                        continue;
                    }
                    Err(err) => return Err(err),
                };

                if let Some(offset) = state.player.vehicle_offset() {
                    if offset > self.inner.vehicle_tolerance {
                        event!(Level::WARN, slot, offset, "removing save with stranded player");
                        store.delete(slot).await?;
                        report.removed_stranded.push(slot);
                        continue;
                    }
                }

                if state.save_slot != slot {
                    event!(
                        Level::INFO,
                        slot,
                        stored = state.save_slot,
                        "restamping slot number"
                    );
                    state.save_slot = slot;
                    store.write(slot, &state).await?;
                    report.restamped.push(slot);
                }
            }

            Ok(report)
        }
        .instrument(span)
        .await
    }
}
