// ── Latest-snapshot holder ──
//
// The current GridState sits behind an `ArcSwapOption`: readers load a
// cheap `Arc` without locking, the coordinator swaps in a whole new state
// per successful poll. Availability and the version counter are `watch`
// channels so consumers can await changes.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::model::{GridSnapshot, GridState};

/// Shared state for one integration instance.
///
/// Mutated only through [`apply`](Self::apply); everything else reads.
/// A failed poll never reaches the store, so the previous state stays.
pub struct GridStore {
    state: ArcSwapOption<GridState>,
    available: watch::Sender<bool>,
    version: watch::Sender<u64>,
}

impl GridStore {
    pub fn new() -> Self {
        let (available, _) = watch::channel(false);
        let (version, _) = watch::channel(0u64);

        Self {
            state: ArcSwapOption::empty(),
            available,
            version,
        }
    }

    /// Replace the current state with one built from `snapshot`.
    ///
    /// The country lookup is rebuilt from scratch; nothing from the previous
    /// state carries over. Returns the newly published state.
    pub fn apply(&self, snapshot: GridSnapshot) -> Arc<GridState> {
        let state = Arc::new(GridState::from_snapshot(snapshot));
        self.state.store(Some(Arc::clone(&state)));

        let became_available = !self.available.send_replace(true);
        if became_available {
            info!("grid data available");
        }
        self.version.send_modify(|v| *v += 1);

        debug!(
            version = *self.version.borrow(),
            links = state.countries().len(),
            "grid state replaced"
        );
        state
    }

    // ── Readers ──────────────────────────────────────────────────────

    /// The current state, or `None` before the first successful poll.
    pub fn current(&self) -> Option<Arc<GridState>> {
        self.state.load_full()
    }

    /// The current snapshot, or `None` before the first successful poll.
    pub fn snapshot(&self) -> Option<GridSnapshot> {
        self.current().map(|state| state.snapshot().clone())
    }

    /// `true` once any poll has succeeded. Never reverts.
    pub fn available(&self) -> bool {
        *self.available.borrow()
    }

    /// When the current snapshot was fetched.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.current().map(|state| state.snapshot().fetched_at())
    }

    /// Number of successful applies so far.
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Receiver that changes on every successful apply.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Receiver for the availability flag.
    pub fn subscribe_available(&self) -> watch::Receiver<bool> {
        self.available.subscribe()
    }
}

impl Default for GridStore {
    fn default() -> Self {
        Self::new()
    }
}
