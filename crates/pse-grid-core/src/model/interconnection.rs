// ── Cross-border interconnection records ──

use serde_json::Value;

use super::megawatts;
use crate::error::CoreError;

/// Countries whose interconnections are exposed as sensors.
pub const LINK_COUNTRIES: [&str; 6] = ["SE", "DE", "CZ", "SK", "UA", "LT"];

const ACTUAL: &str = "wartosc";
const PLANNED: &str = "wartosc_plan";
const PARALLEL: &str = "rownolegly";

/// One country's power-flow entry from `data.przesyly`.
///
/// Only the `id` is checked up front. The flow fields are read on demand
/// and a missing one surfaces as a schema error on that read.
#[derive(Debug, Clone, PartialEq)]
pub struct Interconnection {
    country: String,
    record: Value,
}

impl Interconnection {
    /// Wrap a raw record, or `None` if it has no string `id`.
    pub fn from_record(record: &Value) -> Option<Self> {
        let country = record.get("id")?.as_str()?;
        Some(Self {
            country: country.to_owned(),
            record: record.clone(),
        })
    }

    /// Two-letter country code.
    pub fn country(&self) -> &str {
        &self.country
    }

    /// Raw value of one record field.
    pub fn field(&self, key: &str) -> Result<&Value, CoreError> {
        self.record
            .get(key)
            .ok_or_else(|| CoreError::missing(self.path(key)))
    }

    /// Measured flow in MW.
    pub fn actual(&self) -> Result<i64, CoreError> {
        self.megawatts(ACTUAL)
    }

    /// Scheduled flow in MW.
    pub fn planned(&self) -> Result<i64, CoreError> {
        self.megawatts(PLANNED)
    }

    /// Raw parallel-flow value.
    pub fn parallel(&self) -> Result<&Value, CoreError> {
        self.field(PARALLEL)
    }

    fn megawatts(&self, key: &str) -> Result<i64, CoreError> {
        megawatts(self.field(key)?, &self.path(key))
    }

    fn path(&self, key: &str) -> String {
        format!("data.przesyly[id={}].{key}", self.country)
    }
}
