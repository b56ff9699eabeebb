// ── Host boundary ──
//
// The minimal slice of a home-automation host this crate depends on:
// a startup lifecycle to wait on and a registry of named async
// services. Embedders with a real host bridge these; the CLI uses the
// in-process implementation directly.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::future::BoxFuture;
use strum::Display;
use tokio::sync::watch;
use tracing::debug;

use crate::error::CoreError;

// ── Lifecycle ────────────────────────────────────────────────────

/// Host lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum HostState {
    Starting,
    Running,
    Stopping,
}

/// Receiver side of the host lifecycle, handed to background tasks.
#[derive(Debug, Clone)]
pub struct StartupSignal {
    rx: watch::Receiver<HostState>,
}

impl StartupSignal {
    pub fn is_running(&self) -> bool {
        *self.rx.borrow() == HostState::Running
    }

    /// Resolve once the host reports `Running`.
    ///
    /// Returns `false` if the host went away or started stopping first.
    pub async fn wait_running(&mut self) -> bool {
        match self
            .rx
            .wait_for(|state| *state != HostState::Starting)
            .await
        {
            Ok(state) => *state == HostState::Running,
            Err(_) => false,
        }
    }
}

// ── Services ─────────────────────────────────────────────────────

/// Async callback invoked when a service is called.
pub type ServiceHandler = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ServiceKey {
    domain: String,
    service: String,
}

impl ServiceKey {
    fn new(domain: &str, service: &str) -> Self {
        Self {
            domain: domain.to_owned(),
            service: service.to_owned(),
        }
    }
}

/// Named services keyed by `(domain, service)`.
#[derive(Default)]
pub struct ServiceRegistry {
    services: DashMap<ServiceKey, ServiceHandler>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service. Fails if the name is already taken.
    pub fn register(
        &self,
        domain: &str,
        service: &str,
        handler: ServiceHandler,
    ) -> Result<(), CoreError> {
        match self.services.entry(ServiceKey::new(domain, service)) {
            Entry::Occupied(_) => Err(CoreError::ServiceConflict {
                domain: domain.into(),
                service: service.into(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(handler);
                debug!(domain, service, "service registered");
                Ok(())
            }
        }
    }

    /// Remove a service. Returns `true` if it was registered.
    pub fn remove(&self, domain: &str, service: &str) -> bool {
        let removed = self
            .services
            .remove(&ServiceKey::new(domain, service))
            .is_some();
        if removed {
            debug!(domain, service, "service removed");
        }
        removed
    }

    pub fn has_service(&self, domain: &str, service: &str) -> bool {
        self.services.contains_key(&ServiceKey::new(domain, service))
    }

    /// Invoke a service and wait for its handler to finish.
    pub async fn call(&self, domain: &str, service: &str) -> Result<(), CoreError> {
        // Clone the handler out so no shard lock is held across the await.
        let handler = self
            .services
            .get(&ServiceKey::new(domain, service))
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| CoreError::ServiceNotFound {
                domain: domain.into(),
                service: service.into(),
            })?;
        handler().await;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

// ── Host ─────────────────────────────────────────────────────────

/// In-process host: lifecycle plus service registry.
///
/// Cheaply cloneable via `Arc<HostInner>`.
#[derive(Clone)]
pub struct Host {
    inner: Arc<HostInner>,
}

struct HostInner {
    state: watch::Sender<HostState>,
    services: ServiceRegistry,
}

impl Host {
    /// A host still in its startup sequence.
    pub fn new() -> Self {
        let (state, _) = watch::channel(HostState::Starting);
        Self {
            inner: Arc::new(HostInner {
                state,
                services: ServiceRegistry::new(),
            }),
        }
    }

    /// A host that has already finished starting.
    pub fn running() -> Self {
        let host = Self::new();
        host.mark_running();
        host
    }

    pub fn state(&self) -> HostState {
        *self.inner.state.borrow()
    }

    /// Signal that startup has finished.
    pub fn mark_running(&self) {
        self.set_state(HostState::Running);
    }

    /// Signal that the host is shutting down.
    pub fn mark_stopping(&self) {
        self.set_state(HostState::Stopping);
    }

    pub fn startup_signal(&self) -> StartupSignal {
        StartupSignal {
            rx: self.inner.state.subscribe(),
        }
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.inner.services
    }

    fn set_state(&self, next: HostState) {
        let previous = self.inner.state.send_replace(next);
        if previous != next {
            debug!(%previous, %next, "host state changed");
        }
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures_util::FutureExt;

    use super::*;

    fn counting_handler(counter: &Arc<AtomicUsize>) -> ServiceHandler {
        let counter = Arc::clone(counter);
        Arc::new(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn call_runs_registered_handler() {
        let registry = ServiceRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        registry
            .register("demo", "ping", counting_handler(&counter))
            .unwrap();

        registry.call("demo", "ping").await.unwrap();
        registry.call("demo", "ping").await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let registry = ServiceRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        registry
            .register("demo", "ping", counting_handler(&counter))
            .unwrap();

        let err = registry
            .register("demo", "ping", counting_handler(&counter))
            .unwrap_err();
        assert!(matches!(err, CoreError::ServiceConflict { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn removed_service_cannot_be_called() {
        let registry = ServiceRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        registry
            .register("demo", "ping", counting_handler(&counter))
            .unwrap();

        assert!(registry.remove("demo", "ping"));
        assert!(!registry.remove("demo", "ping"));
        assert!(registry.is_empty());

        let err = registry.call("demo", "ping").await.unwrap_err();
        assert!(matches!(err, CoreError::ServiceNotFound { .. }));
    }

    #[tokio::test]
    async fn startup_signal_resolves_when_running() {
        let host = Host::new();
        let mut signal = host.startup_signal();
        assert!(!signal.is_running());

        let waiter = tokio::spawn(async move { signal.wait_running().await });
        host.mark_running();

        assert!(waiter.await.unwrap());
        assert!(host.startup_signal().is_running());
    }

    #[tokio::test]
    async fn startup_signal_reports_stop_before_start() {
        let host = Host::new();
        let mut signal = host.startup_signal();
        host.mark_stopping();
        assert!(!signal.wait_running().await);
    }
}
