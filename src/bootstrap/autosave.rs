use crate::config::AutosavePolicy;
use crate::coordinator::SaveCoordinator;
use crate::core::{PersistError, Result};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Background task that autosaves on a fixed interval.
pub struct AutosaveWorker {
    stop_tx: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<u64>>,
}

impl AutosaveWorker {
    /// Signals the worker to stop and waits for it. Returns how many autosaves it wrote.
    pub async fn stop(mut self) -> Result<u64> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        match self.join_handle.take() {
            Some(join_handle) => join_handle
                .await
                .map_err(|err| PersistError::Io(format!("autosave worker join: {}", err))),
            None => Ok(0),
        }
    }
}

impl Drop for AutosaveWorker {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(join_handle) = self.join_handle.take() {
            join_handle.abort();
        }
    }
}

/// Start autosaving as configured by `policy`.
pub fn spawn_autosave_worker(
    coordinator: SaveCoordinator,
    policy: &AutosavePolicy,
) -> Result<AutosaveWorker> {
    if !policy.enabled {
        return Err(PersistError::Config(
            "autosave.enabled must be set to start the autosave worker".to_string(),
        ));
    }
    Ok(spawn_autosave_every(
        coordinator,
        Duration::from_secs(policy.interval_secs.max(1)),
    ))
}

/// Start autosaving every `interval`.
pub fn spawn_autosave_every(coordinator: SaveCoordinator, interval: Duration) -> AutosaveWorker {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let join_handle = tokio::spawn(async move {
        let mut written = 0;
        loop {
            tokio::select! {
                _ = &mut stop_rx => {
                    break;
                }
                _ = sleep(interval) => {
                    if coordinator.autosave().await.is_some() {
                        written += 1;
                    }
                }
            }
        }
        written
    });

    AutosaveWorker {
        stop_tx: Some(stop_tx),
        join_handle: Some(join_handle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::CollaboratorSet;
    use crate::config::PersistenceConfig;
    use crate::core::Difficulty;
    use crate::state::GameState;
    use crate::storage::{PreferenceStore, SlotFormat};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_worker_writes_autosave_slot() {
        let dir = TempDir::new().unwrap();
        let config = PersistenceConfig::new(dir.path());
        let coordinator = SaveCoordinator::new(
            &config,
            CollaboratorSet::new(),
            PreferenceStore::detached().shared(),
        );
        coordinator
            .bind_legacy(config.legacy_root(), SlotFormat::Json)
            .await;
        coordinator
            .start_new_game(GameState::new_game("Ada", Difficulty::Normal, Vec::new()))
            .await
            .unwrap();

        let worker = spawn_autosave_every(coordinator.clone(), Duration::from_millis(10));
        sleep(Duration::from_millis(80)).await;
        let written = worker.stop().await.unwrap();

        assert!(written >= 1);
        assert!(dir.path().join("legacy/slots/slot_0.json").is_file());
    }

    #[tokio::test]
    async fn test_disabled_policy_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = PersistenceConfig::new(dir.path());
        let coordinator = SaveCoordinator::new(
            &config,
            CollaboratorSet::new(),
            PreferenceStore::detached().shared(),
        );
        let policy = AutosavePolicy {
            enabled: false,
            ..AutosavePolicy::default()
        };

        assert!(matches!(
            spawn_autosave_worker(coordinator, &policy),
            Err(PersistError::Config(_))
        ));
    }
}
