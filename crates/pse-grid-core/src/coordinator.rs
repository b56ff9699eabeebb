// ── Refresh coordinator ──
//
// Timer ticks and on-demand requests funnel into one refresh pipeline.
// A refresh is single-flight: whoever finds the gate free spawns the
// fetch on a worker task, everyone else waits for that fetch's outcome.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use pse_grid_api::PseClient;

use crate::error::CoreError;
use crate::host::StartupSignal;
use crate::model::GridSnapshot;
use crate::store::GridStore;

/// Result of one refresh, shared by every caller coalesced into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot was fetched and published.
    Updated { at: DateTime<Utc> },
    /// The fetch failed; the previous snapshot is still current.
    Failed { reason: String },
}

impl RefreshOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}

/// Polls the PSE endpoint and publishes snapshots into a [`GridStore`].
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    client: PseClient,
    store: Arc<GridStore>,
    interval: watch::Sender<Duration>,
    /// Held for the whole duration of a fetch. Only `run_refresh` may
    /// hold it, otherwise a follower could wait on a fetch that never runs.
    gate: Arc<Mutex<()>>,
    outcome: watch::Sender<Option<RefreshOutcome>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator {
    /// Create a coordinator. Does NOT start polling -- call
    /// [`start()`](Self::start) to spawn the scheduler.
    pub fn new(
        client: PseClient,
        store: Arc<GridStore>,
        interval: Duration,
    ) -> Result<Self, CoreError> {
        validate_interval(interval)?;
        let (interval, _) = watch::channel(interval);
        let (outcome, _) = watch::channel(None);

        Ok(Self {
            inner: Arc::new(CoordinatorInner {
                client,
                store,
                interval,
                gate: Arc::new(Mutex::new(())),
                outcome,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn store(&self) -> &Arc<GridStore> {
        &self.inner.store
    }

    pub fn client(&self) -> &PseClient {
        &self.inner.client
    }

    pub fn interval(&self) -> Duration {
        *self.inner.interval.borrow()
    }

    /// Change the polling interval. The wait already in progress finishes
    /// on the old interval; the next one uses the new value.
    pub fn set_interval(&self, interval: Duration) -> Result<(), CoreError> {
        validate_interval(interval)?;
        let previous = self.inner.interval.send_replace(interval);
        if previous != interval {
            info!(?previous, ?interval, "refresh interval changed");
        }
        Ok(())
    }

    /// The most recent refresh outcome, if any refresh has finished.
    pub fn last_outcome(&self) -> Option<RefreshOutcome> {
        self.inner.outcome.borrow().clone()
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Refresh now, or join the refresh already in flight.
    ///
    /// Never runs two fetches at once. Concurrent callers all receive the
    /// outcome of the same fetch.
    pub async fn request_refresh(&self) -> RefreshOutcome {
        // Subscribe before probing the gate: the leader publishes only after
        // releasing it, so a follower that saw it held cannot miss the send.
        let mut outcome_rx = self.inner.outcome.subscribe();

        if let Ok(permit) = Arc::clone(&self.inner.gate).try_lock_owned() {
            // The leader takes its own fetch's outcome, never a broadcast
            // from an earlier fetch published after the gate was released.
            let (tx, rx) = oneshot::channel();
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                let outcome = inner.run_refresh(permit).await;
                let _ = tx.send(outcome);
            });
            return rx.await.unwrap_or_else(|_| RefreshOutcome::Failed {
                reason: "refresh task aborted".into(),
            });
        }

        debug!("refresh already in flight, coalescing request");
        if outcome_rx.changed().await.is_err() {
            return RefreshOutcome::Failed {
                reason: "coordinator dropped".into(),
            };
        }
        let outcome = outcome_rx.borrow_and_update().clone();
        outcome.unwrap_or_else(|| RefreshOutcome::Failed {
            reason: "refresh produced no outcome".into(),
        })
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the scheduler.
    ///
    /// Nothing is fetched until `startup` reports the host running. Then a
    /// first refresh runs immediately and subsequent ones follow the interval.
    pub async fn start(&self, startup: StartupSignal) {
        let ctrl = self.clone();
        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(scheduler_task(ctrl, startup, cancel));
        self.inner.task_handles.lock().await.push(handle);
    }

    /// Signal the scheduler to stop without waiting for it.
    pub fn cancel(&self) {
        self.inner.cancel.cancel();
    }

    /// Stop the scheduler and wait for it to exit.
    ///
    /// A fetch already in flight is not interrupted; it completes on its
    /// worker task and still publishes its outcome.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("coordinator stopped");
    }
}

impl CoordinatorInner {
    async fn run_refresh(&self, permit: OwnedMutexGuard<()>) -> RefreshOutcome {
        let outcome = match self.client.fetch().await {
            Ok(document) => {
                let state = self.store.apply(GridSnapshot::new(document));
                let at = state.snapshot().fetched_at();
                debug!(%at, "refresh succeeded");
                RefreshOutcome::Updated { at }
            }
            Err(e) => {
                let err = CoreError::from(e);
                warn!(error = %err, "refresh failed");
                RefreshOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };

        drop(permit);
        self.outcome.send_replace(Some(outcome.clone()));
        outcome
    }
}

fn validate_interval(interval: Duration) -> Result<(), CoreError> {
    if interval.is_zero() {
        return Err(CoreError::Config {
            message: "refresh interval must be greater than zero".into(),
        });
    }
    Ok(())
}

// ── Background tasks ─────────────────────────────────────────────

/// Wait for host startup, refresh once, then refresh on every interval.
async fn scheduler_task(
    coordinator: Coordinator,
    mut startup: StartupSignal,
    cancel: CancellationToken,
) {
    if !startup.is_running() {
        debug!("deferring refresh until host startup completes");
    }
    let started = tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        started = startup.wait_running() => started,
    };
    if !started {
        debug!("host stopped before startup completed, scheduler exiting");
        return;
    }
    info!(interval = ?coordinator.interval(), "scheduled refresh enabled");

    let mut interval_rx = coordinator.inner.interval.subscribe();
    let mut next_wait = Duration::ZERO;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(next_wait) => {
                let outcome = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    outcome = coordinator.request_refresh() => outcome,
                };
                debug!(?outcome, "scheduled refresh finished");
            }
        }
        next_wait = *interval_rx.borrow_and_update();
    }
}
