//! Polling, shared state and sensor fan-out for PSE grid statistics.
//!
//! This crate sits between `pse-grid-api` (one HTTP fetch) and a host that
//! displays sensors:
//!
//! - **[`Coordinator`]**: interval ticks and on-demand requests funneled
//!   into one single-flight refresh. [`start()`](Coordinator::start) waits
//!   for the host to finish starting before the first fetch.
//!
//! - **[`GridStore`]**: the latest [`GridState`] behind an `ArcSwapOption`,
//!   plus the availability flag and a version counter on `watch` channels.
//!   A failed poll never touches it.
//!
//! - **Entities** ([`entity`]): a static descriptor table consumed by
//!   [`SensorEntity`] and [`BinarySensorEntity`] behind the [`Entity`] trait.
//!   Values are read lazily; a missing field is a [`CoreError::Schema`] on
//!   that read.
//!
//! - **Host boundary** ([`host`], [`integration`]): startup lifecycle,
//!   service registry, and the [`setup_entry`] / [`IntegrationInstance`]
//!   load-reconfigure-unload cycle.

pub mod coordinator;
pub mod entity;
pub mod error;
pub mod host;
pub mod integration;
pub mod model;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use coordinator::{Coordinator, RefreshOutcome};
pub use entity::{
    BinarySensorEntity, DeviceInfo, Entity, EntityReport, EntityState, Platform, SensorEntity,
    StateClass, build_entities,
};
pub use error::CoreError;
pub use host::{Host, HostState, ServiceHandler, ServiceRegistry, StartupSignal};
pub use integration::{
    ATTRIBUTION, ConfigEntry, DEFAULT_NAME, DEFAULT_SCAN_INTERVAL, DOMAIN, EntryOptions,
    IntegrationInstance, PSE_GRID_SERVICE, setup_entry,
};
pub use model::{GridSnapshot, GridState, Interconnection, LINK_COUNTRIES, SummaryField};
pub use store::GridStore;

pub use pse_grid_api::{BASE_API_URL, PseClient, TransportConfig};
