// Save coordinator: owns the live game state for the bound profile and moves it
// between memory, collaborators and slot files. The implementation is split into
// focused parts that share this module's private scope.

use crate::collab::CollaboratorSet;
use crate::config::PersistenceConfig;
use crate::core::{AUTOSAVE_SLOT, FIRST_MANUAL_SLOT, InstanceId, PersistError, Result, SlotNumber};
use crate::registry::{ActiveInstance, InstanceRegistry};
use crate::state::GameState;
use crate::storage::{ProfileLayout, SharedPreferences, SlotStore};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::{Mutex, watch};
use tracing::{Instrument, Level, event, info_span};

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReceipt {
    pub slot: SlotNumber,
    pub path: PathBuf,
    pub bytes_written: usize,
    pub saved_at: DateTime<Utc>,
    pub autosave: bool,
}

/// Result of a successful load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReceipt {
    pub slot: SlotNumber,
    pub path: PathBuf,
    /// Collaborators that applied the loaded state.
    pub applied_by: usize,
}

/// Load-screen entry for one slot file.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSummary {
    pub slot: SlotNumber,
    pub status: SlotStatus,
}

impl SlotSummary {
    pub fn is_autosave(&self) -> bool {
        self.slot == AUTOSAVE_SLOT
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlotStatus {
    Readable {
        player_name: String,
        level: u32,
        currency: u64,
        saved_at: Option<DateTime<Utc>>,
    },
    Unreadable(String),
}

/// What a repair scan changed on disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairReport {
    pub scanned: usize,
    pub removed_undecodable: Vec<SlotNumber>,
    pub removed_stranded: Vec<SlotNumber>,
    pub restamped: Vec<SlotNumber>,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        self.removed_undecodable.is_empty()
            && self.removed_stranded.is_empty()
            && self.restamped.is_empty()
    }
}

#[derive(Debug, Clone)]
struct Binding {
    /// `None` in legacy single-profile mode.
    instance_id: Option<InstanceId>,
    store: SlotStore,
}

impl Binding {
    fn from_instance(active: &ActiveInstance) -> Self {
        Self {
            instance_id: Some(active.id),
            store: SlotStore::new(active.layout()),
        }
    }
}

struct Session {
    registry: Option<Arc<Mutex<InstanceRegistry>>>,
    binding_rx: Option<watch::Receiver<Option<ActiveInstance>>>,
    binding: Option<Binding>,
    state: Option<GameState>,
    played_since: Instant,
}

impl Session {
    /// Follow the registry's published binding. Any publish drops the live state.
    fn sync_binding(&mut self) {
        let Some(rx) = self.binding_rx.as_mut() else {
            return;
        };
        if !rx.has_changed().unwrap_or(false) {
            return;
        }
        let next = rx.borrow_and_update().as_ref().map(Binding::from_instance);
        event!(
            Level::DEBUG,
            instance = ?next.as_ref().and_then(|b| b.instance_id),
            "coordinator rebound"
        );
        self.rebind(next);
    }

    fn rebind(&mut self, binding: Option<Binding>) {
        self.binding = binding;
        self.state = None;
        self.played_since = Instant::now();
    }

    /// A binding was published that this session has not followed yet.
    fn binding_moved(&self) -> bool {
        self.binding_rx
            .as_ref()
            .is_some_and(|rx| rx.has_changed().unwrap_or(false))
    }

    fn bound(&self) -> Result<&Binding> {
        self.binding.as_ref().ok_or(PersistError::NoActiveProfile)
    }
}

struct CoordinatorInner {
    collaborators: CollaboratorSet,
    preferences: SharedPreferences,
    max_slot: SlotNumber,
    vehicle_tolerance: f32,
    saving: AtomicBool,
    session: Mutex<Session>,
}

/// Cloneable handle to the save coordinator.
#[derive(Clone)]
pub struct SaveCoordinator {
    inner: Arc<CoordinatorInner>,
}

/// Clears the in-flight flag when a save finishes, however it finishes.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

include!("coordinator/binding.rs");
include!("coordinator/save_path.rs");
include!("coordinator/load_path.rs");
include!("coordinator/maintenance.rs");
