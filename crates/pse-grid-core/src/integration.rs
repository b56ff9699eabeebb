// ── Integration entry points ──
//
// What a host calls to load, reconfigure, and unload one instance. Each
// instance owns its own store and coordinator; nothing is global.

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use pse_grid_api::PseClient;

use crate::coordinator::{Coordinator, RefreshOutcome};
use crate::entity::{Entity, build_entities};
use crate::error::CoreError;
use crate::host::{Host, ServiceHandler};
use crate::store::GridStore;

pub const DOMAIN: &str = "ha_pse_grid_stat";
pub const DEFAULT_NAME: &str = "PSE Grid Statistics";
/// Name of the on-demand refresh service.
pub const PSE_GRID_SERVICE: &str = "PSEGridService";
pub const ATTRIBUTION: &str = "Statistic retrieved from PSE state page";
pub const CONFIGURATION_URL: &str = "https://www.pse.pl";
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// User-tunable options of one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOptions {
    #[serde(with = "duration_secs")]
    pub scan_interval: Duration,
}

impl EntryOptions {
    pub fn from_minutes(minutes: u64) -> Self {
        Self {
            scan_interval: Duration::from_secs(minutes.saturating_mul(60)),
        }
    }
}

impl Default for EntryOptions {
    fn default() -> Self {
        Self {
            scan_interval: DEFAULT_SCAN_INTERVAL,
        }
    }
}

/// Serialize durations as whole seconds.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

/// The host's record of one configured instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub entry_id: String,
    pub title: String,
    pub options: EntryOptions,
}

impl ConfigEntry {
    pub fn new(entry_id: impl Into<String>, options: EntryOptions) -> Self {
        Self {
            entry_id: entry_id.into(),
            title: DEFAULT_NAME.into(),
            options,
        }
    }
}

/// A loaded instance: its store, coordinator and entities.
pub struct IntegrationInstance {
    entry: ConfigEntry,
    host: Host,
    coordinator: Coordinator,
    entities: Vec<Arc<dyn Entity>>,
}

/// Load one instance into `host`.
///
/// Registers the `PSEGridService` refresh service and starts the scheduler.
/// No fetch happens until the host reports it has finished starting.
pub async fn setup_entry(
    host: &Host,
    entry: ConfigEntry,
    client: PseClient,
) -> Result<IntegrationInstance, CoreError> {
    let store = Arc::new(GridStore::new());
    let coordinator = Coordinator::new(client, Arc::clone(&store), entry.options.scan_interval)?;

    host.services()
        .register(DOMAIN, PSE_GRID_SERVICE, refresh_service(&coordinator))?;

    coordinator.start(host.startup_signal()).await;
    let entities = build_entities(&store, &entry.entry_id);

    info!(
        entry_id = %entry.entry_id,
        endpoint = %coordinator.client().endpoint(),
        interval = ?entry.options.scan_interval,
        entities = entities.len(),
        "integration loaded"
    );

    Ok(IntegrationInstance {
        entry,
        host: host.clone(),
        coordinator,
        entities,
    })
}

fn refresh_service(coordinator: &Coordinator) -> ServiceHandler {
    let coordinator = coordinator.clone();
    Arc::new(move || {
        let coordinator = coordinator.clone();
        async move {
            let outcome = coordinator.request_refresh().await;
            debug!(?outcome, "service-requested refresh finished");
        }
        .boxed()
    })
}

impl IntegrationInstance {
    pub fn entry(&self) -> &ConfigEntry {
        &self.entry
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn store(&self) -> &Arc<GridStore> {
        self.coordinator.store()
    }

    pub fn entities(&self) -> &[Arc<dyn Entity>] {
        &self.entities
    }

    /// Apply changed options: the new interval, then an immediate refresh.
    pub async fn update_options(
        &mut self,
        options: EntryOptions,
    ) -> Result<RefreshOutcome, CoreError> {
        self.coordinator.set_interval(options.scan_interval)?;
        self.entry.options = options;
        Ok(self.coordinator.request_refresh().await)
    }

    /// Remove the refresh service and stop polling.
    pub async fn unload(self) {
        if !self.host.services().remove(DOMAIN, PSE_GRID_SERVICE) {
            debug!("refresh service was already gone");
        }
        self.coordinator.shutdown().await;
        info!(entry_id = %self.entry.entry_id, "integration unloaded");
    }
}

impl Drop for IntegrationInstance {
    /// Dropping without [`unload`](Self::unload) still stops polling and
    /// releases the service key.
    fn drop(&mut self) {
        self.host.services().remove(DOMAIN, PSE_GRID_SERVICE);
        self.coordinator.cancel();
    }
}
