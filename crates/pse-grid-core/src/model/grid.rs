// ── Grid snapshot and derived state ──

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use strum::{AsRefStr, Display};
use tracing::debug;

use super::interconnection::Interconnection;
use super::{lookup, megawatts};
use crate::error::CoreError;

const SUMMARY_PATH: [&str; 2] = ["data", "podsumowanie"];
const LINKS_PATH: [&str; 2] = ["data", "przesyly"];

/// Fields of the national summary record, named by their upstream keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum SummaryField {
    #[strum(serialize = "zapotrzebowanie")]
    Demand,
    #[strum(serialize = "generacja")]
    Generation,
    #[strum(serialize = "wodne")]
    Water,
    #[strum(serialize = "wiatrowe")]
    Wind,
    #[strum(serialize = "PV")]
    Solar,
    #[strum(serialize = "cieplne")]
    Thermal,
    #[strum(serialize = "inne")]
    Other,
}

/// One fetched-and-parsed transmission map document.
///
/// Immutable once built; a newer poll replaces it wholesale. Cloning is
/// cheap since the document is shared.
#[derive(Debug, Clone)]
pub struct GridSnapshot {
    document: Arc<Value>,
    fetched_at: DateTime<Utc>,
}

impl GridSnapshot {
    /// Wrap a freshly fetched document, stamped with the current time.
    pub fn new(document: Value) -> Self {
        Self::at(document, Utc::now())
    }

    /// Wrap a document with an explicit fetch time.
    pub fn at(document: Value, fetched_at: DateTime<Utc>) -> Self {
        Self {
            document: Arc::new(document),
            fetched_at,
        }
    }

    /// The raw upstream document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Read one summary figure in MW.
    pub fn summary(&self, field: SummaryField) -> Result<i64, CoreError> {
        let path = [SUMMARY_PATH[0], SUMMARY_PATH[1], field.as_ref()];
        let value = lookup(&self.document, &path)?;
        megawatts(value, &path.join("."))
    }

    /// National demand in MW.
    pub fn demand(&self) -> Result<i64, CoreError> {
        self.summary(SummaryField::Demand)
    }

    /// National generation in MW.
    pub fn generation(&self) -> Result<i64, CoreError> {
        self.summary(SummaryField::Generation)
    }

    /// `generation − demand` in MW. Positive means the grid is exporting.
    pub fn balance(&self) -> Result<i64, CoreError> {
        Ok(self.generation()?.saturating_sub(self.demand()?))
    }

    /// `true` when generation exceeds demand.
    pub fn is_exporting(&self) -> Result<bool, CoreError> {
        Ok(self.balance()? > 0)
    }

    /// Interconnection records in upstream order.
    ///
    /// Records without a string `id` are skipped. A missing list yields
    /// nothing; the per-country reads report the absence instead.
    pub fn interconnections(&self) -> impl Iterator<Item = Interconnection> + '_ {
        lookup(&self.document, &LINKS_PATH)
            .ok()
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|record| {
                let parsed = Interconnection::from_record(record);
                if parsed.is_none() {
                    debug!(%record, "skipping interconnection record without id");
                }
                parsed
            })
    }
}

impl PartialEq for GridSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.fetched_at == other.fetched_at && self.document == other.document
    }
}

/// A snapshot together with its country-code lookup.
///
/// Built once per successful poll and published as a unit so readers
/// never pair a new document with an old index.
#[derive(Debug)]
pub struct GridState {
    snapshot: GridSnapshot,
    links: HashMap<String, Interconnection>,
}

impl GridState {
    /// Index the snapshot's interconnections by country code.
    ///
    /// Duplicate codes resolve last-write-wins.
    pub fn from_snapshot(snapshot: GridSnapshot) -> Self {
        let mut links = HashMap::new();
        for link in snapshot.interconnections() {
            if let Some(previous) = links.insert(link.country().to_owned(), link) {
                debug!(country = previous.country(), "duplicate interconnection record, keeping last");
            }
        }
        Self { snapshot, links }
    }

    pub fn snapshot(&self) -> &GridSnapshot {
        &self.snapshot
    }

    /// Interconnection with `country`, or a schema error if this poll omitted it.
    pub fn link(&self, country: &str) -> Result<&Interconnection, CoreError> {
        self.links
            .get(country)
            .ok_or_else(|| CoreError::missing(format!("data.przesyly[id={country}]")))
    }

    /// Country codes present in this poll, sorted.
    pub fn countries(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.links.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}
