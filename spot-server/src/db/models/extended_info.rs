//! Extended-info entries and reconciliation
//!
//! A spot owns a set of key/value metadata entries. Incoming updates are
//! merged through [`reconcile`] so that key uniqueness per spot holds no
//! matter how many times a client resubmits the same keys.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One key/value metadata entry owned by a spot.
///
/// `id` is the storage row id; `None` until the store assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedInfoEntry {
    pub id: Option<i64>,
    pub key: String,
    pub value: String,
}

impl ExtendedInfoEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: None,
            key: key.into(),
            value: value.into(),
        }
    }
}

/// How entries absent from the incoming map are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Keep existing entries whose key is not mentioned.
    Merge,
    /// Remove existing entries whose key is not mentioned (full replacement,
    /// the PUT semantics).
    Replace,
}

/// Merge `incoming` key/value pairs into `existing` entries.
///
/// - A key present in both overwrites the value in place, preserving the
///   entry's row id.
/// - A key only in `incoming` becomes a new entry.
/// - A key only in `existing` is kept (`Merge`) or removed (`Replace`).
///
/// Invariant: the result never holds two entries with the same key, even if
/// `existing` arrived with duplicates.
pub fn reconcile(
    existing: Vec<ExtendedInfoEntry>,
    incoming: &BTreeMap<String, String>,
    mode: ReconcileMode,
) -> Vec<ExtendedInfoEntry> {
    let mut result = Vec::with_capacity(existing.len() + incoming.len());
    let mut kept_keys: BTreeSet<String> = BTreeSet::new();

    for mut entry in existing {
        if kept_keys.contains(&entry.key) {
            // Collapse duplicates that predate reconciliation.
            continue;
        }
        match incoming.get(&entry.key) {
            Some(value) => {
                entry.value = value.clone();
                kept_keys.insert(entry.key.clone());
                result.push(entry);
            }
            None => {
                if mode == ReconcileMode::Merge {
                    kept_keys.insert(entry.key.clone());
                    result.push(entry);
                }
            }
        }
    }

    for (key, value) in incoming {
        if !kept_keys.contains(key) {
            result.push(ExtendedInfoEntry::new(key.clone(), value.clone()));
        }
    }

    result
}
