use std::sync::Arc;

use super::{
    Attributes, BinarySensorDescription, DeviceInfo, Entity, EntityState, Platform,
    SensorDescription, StateClass,
};
use crate::error::CoreError;
use crate::model::GridState;
use crate::store::GridStore;

fn current(store: &GridStore) -> Result<Arc<GridState>, CoreError> {
    store.current().ok_or(CoreError::NoData)
}

/// A numeric or text sensor driven by one [`SensorDescription`] row.
pub struct SensorEntity {
    store: Arc<GridStore>,
    description: &'static SensorDescription,
    device: Arc<DeviceInfo>,
}

impl SensorEntity {
    pub fn new(
        store: Arc<GridStore>,
        description: &'static SensorDescription,
        device: Arc<DeviceInfo>,
    ) -> Self {
        Self {
            store,
            description,
            device,
        }
    }
}

impl Entity for SensorEntity {
    fn unique_id(&self) -> &'static str {
        self.description.common.key
    }

    fn name(&self) -> &'static str {
        self.description.common.name
    }

    fn icon(&self) -> &'static str {
        self.description.common.icon
    }

    fn platform(&self) -> Platform {
        Platform::Sensor
    }

    fn unit(&self) -> Option<&'static str> {
        self.description.common.unit
    }

    fn state_class(&self) -> Option<StateClass> {
        self.description.common.state_class
    }

    fn available(&self) -> bool {
        self.store.available()
    }

    fn state(&self) -> Result<EntityState, CoreError> {
        let state = current(&self.store)?;
        (self.description.value)(&state)
    }

    fn attributes(&self) -> Result<Attributes, CoreError> {
        match self.description.attributes {
            Some(extract) => {
                let state = current(&self.store)?;
                extract(&state)
            }
            None => Ok(Attributes::new()),
        }
    }

    fn device_info(&self) -> &DeviceInfo {
        &self.device
    }
}

/// An on/off sensor driven by one [`BinarySensorDescription`] row.
pub struct BinarySensorEntity {
    store: Arc<GridStore>,
    description: &'static BinarySensorDescription,
    device: Arc<DeviceInfo>,
}

impl BinarySensorEntity {
    pub fn new(
        store: Arc<GridStore>,
        description: &'static BinarySensorDescription,
        device: Arc<DeviceInfo>,
    ) -> Self {
        Self {
            store,
            description,
            device,
        }
    }

    pub fn is_on(&self) -> Result<bool, CoreError> {
        let state = current(&self.store)?;
        (self.description.is_on)(&state)
    }
}

impl Entity for BinarySensorEntity {
    fn unique_id(&self) -> &'static str {
        self.description.common.key
    }

    fn name(&self) -> &'static str {
        self.description.common.name
    }

    fn icon(&self) -> &'static str {
        self.description.common.icon
    }

    fn platform(&self) -> Platform {
        Platform::BinarySensor
    }

    fn available(&self) -> bool {
        self.store.available()
    }

    fn state(&self) -> Result<EntityState, CoreError> {
        self.is_on().map(EntityState::from_bool)
    }

    fn device_info(&self) -> &DeviceInfo {
        &self.device
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::{BINARY_SENSOR_TYPES, SENSOR_TYPES};
    use crate::model::GridSnapshot;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn store_with(document: Value) -> Arc<GridStore> {
        let store = Arc::new(GridStore::new());
        store.apply(GridSnapshot::new(document));
        store
    }

    fn summary(generation: i64, demand: i64) -> Value {
        json!({
            "data": {
                "podsumowanie": { "generacja": generation, "zapotrzebowanie": demand },
                "przesyly": [
                    { "id": "SE", "wartosc": 100, "wartosc_plan": 120, "rownolegly": 5 }
                ]
            }
        })
    }

    fn sensor(store: &Arc<GridStore>, key: &str) -> SensorEntity {
        let description = SENSOR_TYPES.iter().find(|d| d.common.key == key).unwrap();
        SensorEntity::new(
            Arc::clone(store),
            description,
            Arc::new(DeviceInfo::for_entry("test")),
        )
    }

    fn binary(store: &Arc<GridStore>) -> BinarySensorEntity {
        BinarySensorEntity::new(
            Arc::clone(store),
            &BINARY_SENSOR_TYPES[0],
            Arc::new(DeviceInfo::for_entry("test")),
        )
    }

    #[test]
    fn exporting_grid() {
        let store = store_with(summary(5000, 4800));

        assert_eq!(
            sensor(&store, "pse-power-difference").state().unwrap(),
            EntityState::Number(200)
        );
        assert_eq!(
            sensor(&store, "pse-power-state-description").state().unwrap(),
            EntityState::Text("Exporting".into())
        );
        assert!(binary(&store).is_on().unwrap());
        assert_eq!(binary(&store).state().unwrap(), EntityState::On);
    }

    #[test]
    fn importing_grid() {
        let store = store_with(summary(4500, 4800));

        assert_eq!(
            sensor(&store, "pse-power-difference").state().unwrap(),
            EntityState::Number(-300)
        );
        assert_eq!(
            sensor(&store, "pse-power-state-description").state().unwrap(),
            EntityState::Text("Importing".into())
        );
        assert!(!binary(&store).is_on().unwrap());
    }

    #[test]
    fn link_sensor_value_and_attributes() {
        let store = store_with(summary(5000, 4800));
        let link = sensor(&store, "pse-link-se");

        assert_eq!(link.state().unwrap(), EntityState::Number(100));
        assert_eq!(
            link.attributes().unwrap(),
            Attributes::from([
                ("parallel", json!(5)),
                ("plan", json!(120)),
                ("value", json!(100)),
            ])
        );
        assert_eq!(link.unit(), Some("MW"));
        assert_eq!(link.icon(), "mdi:transmission-tower");
    }

    #[test]
    fn missing_country_is_schema_error() {
        let store = store_with(summary(5000, 4800));
        let err = sensor(&store, "pse-link-de").state().unwrap_err();
        assert!(matches!(err, CoreError::Schema { .. }), "got {err:?}");
        assert!(sensor(&store, "pse-link-de").attributes().is_err());
    }

    #[test]
    fn missing_summary_key_is_schema_error() {
        let store = store_with(json!({ "data": { "podsumowanie": { "generacja": 5000 } } }));
        let err = sensor(&store, "pse-required-power").state().unwrap_err();
        assert!(
            matches!(&err, CoreError::Schema { path, .. } if path == "data.podsumowanie.zapotrzebowanie"),
            "got {err:?}"
        );
        // Availability is about fetch history, not about the payload shape.
        assert!(sensor(&store, "pse-required-power").available());
    }

    #[test]
    fn no_data_before_first_fetch() {
        let store = Arc::new(GridStore::new());

        let entity = sensor(&store, "pse-generated-power");
        assert!(!entity.available());
        assert!(matches!(entity.state(), Err(CoreError::NoData)));
        assert!(matches!(binary(&store).is_on(), Err(CoreError::NoData)));
    }

    #[test]
    fn unit_free_rows_report_none() {
        let store = store_with(summary(1, 1));
        assert_eq!(sensor(&store, "pse-power-state-description").unit(), None);
        assert_eq!(binary(&store).unit(), None);
        assert_eq!(binary(&store).platform(), Platform::BinarySensor);
    }
}
