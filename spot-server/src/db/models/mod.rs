//! Data models
//!
//! Domain types for spots and their extended-info entries, plus the
//! create/update payloads and JSON representation used by the API layer.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod extended_info;
pub mod serde_helpers;
pub mod spot;

pub use extended_info::{ExtendedInfoEntry, ReconcileMode, reconcile};
pub use spot::{Location, Spot, SpotCreate, SpotJson, SpotUpdate};
