// ── Descriptor tables ──
//
// One row per exposed value. Adding a sensor means adding a row here;
// the entity types never change.

use serde_json::json;

use super::{Attributes, EntityState, StateClass};
use crate::error::CoreError;
use crate::model::{GridState, SummaryField};

/// Extract a sensor value from the current state.
pub type ValueFn = fn(&GridState) -> Result<EntityState, CoreError>;

/// Extract extra attributes from the current state.
pub type AttributesFn = fn(&GridState) -> Result<Attributes, CoreError>;

/// Extract a binary sensor's on/off state.
pub type IsOnFn = fn(&GridState) -> Result<bool, CoreError>;

const MEGAWATT: &str = "MW";

/// Metadata shared by both platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDescription {
    /// Unique id of the entity built from this row.
    pub key: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub unit: Option<&'static str>,
    pub state_class: Option<StateClass>,
}

impl EntityDescription {
    const fn megawatts(key: &'static str, name: &'static str, icon: &'static str) -> Self {
        Self {
            key,
            name,
            icon,
            unit: Some(MEGAWATT),
            state_class: Some(StateClass::Measurement),
        }
    }

    const fn plain(key: &'static str, name: &'static str, icon: &'static str) -> Self {
        Self {
            key,
            name,
            icon,
            unit: None,
            state_class: None,
        }
    }
}

/// One sensor row.
#[derive(Debug, Clone, Copy)]
pub struct SensorDescription {
    pub common: EntityDescription,
    pub value: ValueFn,
    pub attributes: Option<AttributesFn>,
}

/// One binary sensor row.
#[derive(Debug, Clone, Copy)]
pub struct BinarySensorDescription {
    pub common: EntityDescription,
    pub is_on: IsOnFn,
}

// ── Extraction helpers ───────────────────────────────────────────────

fn summary(state: &GridState, field: SummaryField) -> Result<EntityState, CoreError> {
    state.snapshot().summary(field).map(EntityState::Number)
}

fn link_value(state: &GridState, country: &str) -> Result<EntityState, CoreError> {
    state.link(country)?.actual().map(EntityState::Number)
}

fn link_attributes(state: &GridState, country: &str) -> Result<Attributes, CoreError> {
    let link = state.link(country)?;
    Ok(Attributes::from([
        ("parallel", link.parallel()?.clone()),
        ("plan", json!(link.planned()?)),
        ("value", json!(link.actual()?)),
    ]))
}

fn power_state_description(state: &GridState) -> Result<EntityState, CoreError> {
    let text = if state.snapshot().is_exporting()? {
        "Exporting"
    } else {
        "Importing"
    };
    Ok(EntityState::Text(text.into()))
}

macro_rules! link_sensor {
    ($key:literal, $country:literal) => {
        SensorDescription {
            common: EntityDescription::megawatts(
                $key,
                concat!("PSE Grid Link with ", $country),
                "mdi:transmission-tower",
            ),
            value: |state: &GridState| link_value(state, $country),
            attributes: Some(|state: &GridState| link_attributes(state, $country)),
        }
    };
}

// ── Tables ───────────────────────────────────────────────────────────

pub static SENSOR_TYPES: [SensorDescription; 15] = [
    link_sensor!("pse-link-se", "SE"),
    link_sensor!("pse-link-de", "DE"),
    link_sensor!("pse-link-cz", "CZ"),
    link_sensor!("pse-link-sk", "SK"),
    link_sensor!("pse-link-ua", "UA"),
    link_sensor!("pse-link-lt", "LT"),
    SensorDescription {
        common: EntityDescription::megawatts(
            "pse-required-power",
            "PSE Grid Poland Power Consumption",
            "mdi:transmission-tower-import",
        ),
        value: |state: &GridState| summary(state, SummaryField::Demand),
        attributes: None,
    },
    SensorDescription {
        common: EntityDescription::megawatts(
            "pse-generated-power",
            "PSE Grid Poland Power Generation",
            "mdi:transmission-tower-export",
        ),
        value: |state: &GridState| summary(state, SummaryField::Generation),
        attributes: None,
    },
    SensorDescription {
        common: EntityDescription::megawatts(
            "pse-power-difference",
            "PSE Grid Power Demand/Required Difference",
            "mdi:transmission-tower",
        ),
        value: |state: &GridState| state.snapshot().balance().map(EntityState::Number),
        attributes: None,
    },
    SensorDescription {
        common: EntityDescription::megawatts(
            "pse-power-production-water",
            "PSE Grid Power Power production by Water",
            "mdi:hydro-power",
        ),
        value: |state: &GridState| summary(state, SummaryField::Water),
        attributes: None,
    },
    SensorDescription {
        common: EntityDescription::megawatts(
            "pse-power-production-wind",
            "PSE Grid Power Power production by Wind",
            "mdi:wind-turbine",
        ),
        value: |state: &GridState| summary(state, SummaryField::Wind),
        attributes: None,
    },
    SensorDescription {
        common: EntityDescription::megawatts(
            "pse-power-production-pv",
            "PSE Grid Power Power production by Solar panels",
            "mdi:solar-power",
        ),
        value: |state: &GridState| summary(state, SummaryField::Solar),
        attributes: None,
    },
    SensorDescription {
        common: EntityDescription::megawatts(
            "pse-power-production-coal",
            "PSE Grid Power Power production by Coal",
            "mdi:transmission-tower-export",
        ),
        value: |state: &GridState| summary(state, SummaryField::Thermal),
        attributes: None,
    },
    SensorDescription {
        common: EntityDescription::megawatts(
            "pse-power-production-other",
            "PSE Grid Power Power production by Other sources",
            "mdi:transmission-tower-export",
        ),
        value: |state: &GridState| summary(state, SummaryField::Other),
        attributes: None,
    },
    SensorDescription {
        common: EntityDescription::plain(
            "pse-power-state-description",
            "PSE Grid Power Exporting State Value",
            "mdi:transmission-tower-export",
        ),
        value: power_state_description,
        attributes: None,
    },
];

pub static BINARY_SENSOR_TYPES: [BinarySensorDescription; 1] = [BinarySensorDescription {
    common: EntityDescription::plain(
        "pse-power-state-binary",
        "PSE Grid Power Exporting State",
        "mdi:transmission-tower-export",
    ),
    is_on: |state: &GridState| state.snapshot().is_exporting(),
}];
