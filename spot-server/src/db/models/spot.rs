//! Spot Model

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::extended_info::{ExtendedInfoEntry, ReconcileMode, reconcile};
use super::serde_helpers::capacity_flexible;

/// Geographic position in decimal degrees.
///
/// Serialized as JSON numbers; stored as exact decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(with = "rust_decimal::serde::float")]
    pub latitude: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub longitude: Decimal,
}

/// Spot entity: a physical place with capacity, position and metadata.
///
/// The version fingerprint (ETag) is never stored; it is computed from this
/// state on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spot {
    pub id: i64,
    pub name: String,
    pub capacity: Option<u32>,
    pub location: Option<Location>,
    pub extended_info: Vec<ExtendedInfoEntry>,
}

impl Spot {
    /// Replace this spot's state with a PUT payload.
    ///
    /// A PUT carries the full representation, so extended info is reconciled
    /// in `Replace` mode: values are overwritten in place, unmentioned keys
    /// are dropped, and no key can end up duplicated.
    pub fn apply_update(&mut self, update: SpotUpdate) {
        self.name = update.name;
        self.capacity = update.capacity;
        self.location = update.location;
        self.extended_info = reconcile(
            std::mem::take(&mut self.extended_info),
            &update.extended_info,
            ReconcileMode::Replace,
        );
    }

    /// Extended info as a key/value map (keys are unique per spot).
    pub fn extended_info_map(&self) -> BTreeMap<String, String> {
        self.extended_info
            .iter()
            .map(|e| (e.key.clone(), e.value.clone()))
            .collect()
    }
}

/// Spot creation payload (POST body).
#[derive(Debug, Clone, Deserialize)]
pub struct SpotCreate {
    pub name: String,
    #[serde(default, deserialize_with = "capacity_flexible")]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub extended_info: BTreeMap<String, String>,
}

/// Spot update payload (PUT body, full representation).
///
/// Unknown fields (such as `id` from a round-tripped GET body) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotUpdate {
    pub name: String,
    #[serde(default, deserialize_with = "capacity_flexible")]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub extended_info: BTreeMap<String, String>,
}

/// Wire representation of a spot.
#[derive(Debug, Clone, Serialize)]
pub struct SpotJson {
    pub id: i64,
    pub name: String,
    pub capacity: Option<u32>,
    pub location: Option<Location>,
    pub extended_info: BTreeMap<String, String>,
}

impl From<Spot> for SpotJson {
    fn from(spot: Spot) -> Self {
        let extended_info = spot.extended_info_map();
        Self {
            id: spot.id,
            name: spot.name,
            capacity: spot.capacity,
            location: spot.location,
            extended_info,
        }
    }
}
