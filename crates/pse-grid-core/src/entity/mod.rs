// ── Entity fan-out ──
//
// Every exposed value is one row in a static descriptor table. Two generic
// entity types (numeric/text sensor and binary sensor) read their row's
// extraction function against the shared GridStore. Hosts only ever see
// `Arc<dyn Entity>`.

mod description;
mod sensor;

pub use description::{
    AttributesFn, BINARY_SENSOR_TYPES, BinarySensorDescription, EntityDescription, IsOnFn,
    SENSOR_TYPES, SensorDescription, ValueFn,
};
pub use sensor::{BinarySensorEntity, SensorEntity};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;
use strum::Display;

use crate::error::CoreError;
use crate::integration::{ATTRIBUTION, CONFIGURATION_URL, DOMAIN};
use crate::store::GridStore;

/// Extra per-entity key/value pairs, ordered by key.
pub type Attributes = BTreeMap<&'static str, Value>;

/// Which host platform an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Sensor,
    BinarySensor,
}

/// How a host should aggregate a sensor's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
}

// ── State ────────────────────────────────────────────────────────────

/// Current value of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityState {
    /// Whole megawatts.
    Number(i64),
    Text(String),
    On,
    Off,
}

impl EntityState {
    pub fn from_bool(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

impl Serialize for EntityState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_i64(*n),
            Self::Text(s) => serializer.serialize_str(s),
            Self::On => serializer.serialize_str("on"),
            Self::Off => serializer.serialize_str("off"),
        }
    }
}

// ── Device ───────────────────────────────────────────────────────────

/// Host device record every entity of one instance is grouped under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// `(DOMAIN, entry_id)`.
    pub identifiers: (String, String),
    pub name: String,
    pub entry_type: String,
    pub configuration_url: String,
}

impl DeviceInfo {
    pub fn for_entry(entry_id: &str) -> Self {
        Self {
            identifiers: (DOMAIN.to_owned(), entry_id.to_owned()),
            name: "PSE Grid".into(),
            entry_type: "service".into(),
            configuration_url: CONFIGURATION_URL.into(),
        }
    }
}

// ── Entity trait ─────────────────────────────────────────────────────

/// The surface a host needs to register and poll one entity.
pub trait Entity: Send + Sync {
    /// Stable id; equal to the descriptor key.
    fn unique_id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn icon(&self) -> &'static str;

    fn platform(&self) -> Platform;

    fn unit(&self) -> Option<&'static str> {
        None
    }

    fn state_class(&self) -> Option<StateClass> {
        None
    }

    /// `true` once the instance has fetched at least once.
    fn available(&self) -> bool;

    /// Read the current value.
    ///
    /// `NoData` before the first successful refresh, `Schema` when the
    /// current document lacks a field this entity needs.
    fn state(&self) -> Result<EntityState, CoreError>;

    fn attributes(&self) -> Result<Attributes, CoreError> {
        Ok(Attributes::new())
    }

    fn device_info(&self) -> &DeviceInfo;

    fn attribution(&self) -> &'static str {
        ATTRIBUTION
    }
}

impl fmt::Debug for dyn Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("unique_id", &self.unique_id())
            .field("platform", &self.platform())
            .finish_non_exhaustive()
    }
}

/// Instantiate every sensor and binary sensor for one instance.
///
/// Order follows the descriptor tables: sensors first, then binary sensors.
pub fn build_entities(store: &Arc<GridStore>, entry_id: &str) -> Vec<Arc<dyn Entity>> {
    let device = Arc::new(DeviceInfo::for_entry(entry_id));

    let sensors = SENSOR_TYPES.iter().map(|description| {
        Arc::new(SensorEntity::new(
            Arc::clone(store),
            description,
            Arc::clone(&device),
        )) as Arc<dyn Entity>
    });
    let binary_sensors = BINARY_SENSOR_TYPES.iter().map(|description| {
        Arc::new(BinarySensorEntity::new(
            Arc::clone(store),
            description,
            Arc::clone(&device),
        )) as Arc<dyn Entity>
    });

    sensors.chain(binary_sensors).collect()
}

// ── Report ───────────────────────────────────────────────────────────

/// Point-in-time, owned view of one entity for display and serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityReport {
    pub unique_id: &'static str,
    pub name: &'static str,
    pub platform: Platform,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<EntityState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    #[serde(skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    /// Why `state` or `attributes` could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EntityReport {
    pub fn capture(entity: &dyn Entity) -> Self {
        let (state, state_error) = match entity.state() {
            Ok(state) => (Some(state), None),
            Err(e) => (None, Some(e)),
        };
        let (attributes, attributes_error) = match entity.attributes() {
            Ok(attributes) => (attributes, None),
            Err(e) => (Attributes::new(), Some(e)),
        };
        let error = state_error.or(attributes_error).map(|e| e.to_string());

        Self {
            unique_id: entity.unique_id(),
            name: entity.name(),
            platform: entity.platform(),
            available: entity.available(),
            state,
            unit: entity.unit(),
            attributes,
            error,
        }
    }
}
