//! Optimistic concurrency control
//!
//! Every spot exposes a version fingerprint (served as the `ETag` header)
//! derived from its full persisted state. Writers must present the
//! fingerprint they last saw; a missing or stale fingerprint is the same
//! conflict outcome and leaves the store untouched.

use std::sync::Arc;

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::db::models::Spot;
use crate::db::repository::{RepoError, SpotStore};

/// Conditional-update failures.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Spot {0} not found")]
    NotFound(i64),

    #[error("Fingerprint missing or stale for spot {0}")]
    Conflict(i64),

    #[error(transparent)]
    Store(#[from] RepoError),
}

/// Hash one field with a length prefix so adjacent fields can never blur
/// into each other.
fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

/// Compute the version fingerprint of a spot.
///
/// Deterministic over (id, name, capacity, location, extended info sorted
/// by key). Entry row ids do not participate: the fingerprint tracks the
/// key/value set, not storage bookkeeping.
pub fn compute_fingerprint(spot: &Spot) -> String {
    let mut hasher = Sha256::new();

    update_field(&mut hasher, &spot.id.to_be_bytes());
    update_field(&mut hasher, spot.name.as_bytes());
    update_field(
        &mut hasher,
        spot.capacity
            .map(|c| c.to_string())
            .unwrap_or_default()
            .as_bytes(),
    );
    update_field(
        &mut hasher,
        spot.location
            .as_ref()
            .map(|l| format!("{},{}", l.latitude, l.longitude))
            .unwrap_or_default()
            .as_bytes(),
    );

    let mut entries: Vec<(&str, &str)> = spot
        .extended_info
        .iter()
        .map(|e| (e.key.as_str(), e.value.as_str()))
        .collect();
    entries.sort();
    for (key, value) in entries {
        update_field(&mut hasher, key.as_bytes());
        update_field(&mut hasher, value.as_bytes());
    }

    format!("{:x}", hasher.finalize())
}

/// Serializes conditional updates per spot.
///
/// Each spot gets its own async mutex held for the whole
/// read-compare-mutate-write section, so two concurrent writers against the
/// same spot serialize and at most one of them can win a given fingerprint.
/// Reads never touch these locks.
#[derive(Debug, Default)]
pub struct EtagController {
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl EtagController {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, id: i64) -> Arc<Mutex<()>> {
        self.locks.entry(id).or_default().value().clone()
    }

    /// Apply `mutate` to the spot at `id` iff `expected` matches the
    /// fingerprint of the currently stored state.
    ///
    /// Returns the updated spot together with its new fingerprint. On
    /// [`UpdateError::Conflict`] (missing or stale fingerprint) and on any
    /// store error the stored state is left unchanged.
    pub async fn conditional_update<F>(
        &self,
        store: &dyn SpotStore,
        id: i64,
        expected: Option<&str>,
        mutate: F,
    ) -> Result<(Spot, String), UpdateError>
    where
        F: FnOnce(&mut Spot),
    {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let mut spot = store.get(id).await?.ok_or(UpdateError::NotFound(id))?;
        let current = compute_fingerprint(&spot);
        match expected {
            Some(tag) if tag == current => {}
            _ => return Err(UpdateError::Conflict(id)),
        }

        mutate(&mut spot);
        store.put(id, &spot).await?;

        let fingerprint = compute_fingerprint(&spot);
        Ok((spot, fingerprint))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::*;
    use crate::db::models::{Location, SpotCreate};
    use crate::db::repository::memory::MemorySpotStore;

    fn create_payload(name: &str) -> SpotCreate {
        SpotCreate {
            name: name.to_string(),
            capacity: Some(10),
            location: Some(Location {
                latitude: Decimal::from(55),
                longitude: Decimal::from(30),
            }),
            extended_info: BTreeMap::new(),
        }
    }

    async fn seeded_store() -> (MemorySpotStore, i64) {
        let store = MemorySpotStore::new();
        let spot = store.insert(create_payload("Fingerprint test")).await.unwrap();
        (store, spot.id)
    }

    #[tokio::test]
    async fn fingerprint_is_stable_across_reads() {
        let (store, id) = seeded_store().await;
        let first = compute_fingerprint(&store.get(id).await.unwrap().unwrap());
        let second = compute_fingerprint(&store.get(id).await.unwrap().unwrap());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn fingerprint_changes_with_any_field() {
        let (store, id) = seeded_store().await;
        let base = store.get(id).await.unwrap().unwrap();
        let original = compute_fingerprint(&base);

        let mut renamed = base.clone();
        renamed.name = "Renamed".to_string();
        assert_ne!(compute_fingerprint(&renamed), original);

        let mut resized = base.clone();
        resized.capacity = Some(11);
        assert_ne!(compute_fingerprint(&resized), original);

        let mut moved = base.clone();
        moved.location = None;
        assert_ne!(compute_fingerprint(&moved), original);

        let mut annotated = base.clone();
        annotated
            .extended_info
            .push(crate::db::models::ExtendedInfoEntry::new("k", "v"));
        assert_ne!(compute_fingerprint(&annotated), original);
    }

    #[tokio::test]
    async fn missing_fingerprint_conflicts_and_leaves_state_unchanged() {
        let (store, id) = seeded_store().await;
        let controller = EtagController::new();
        let before = store.get(id).await.unwrap().unwrap();

        let result = controller
            .conditional_update(&store, id, None, |spot| spot.capacity = Some(99))
            .await;

        assert!(matches!(result, Err(UpdateError::Conflict(_))));
        assert_eq!(store.get(id).await.unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn stale_fingerprint_conflicts_and_intervening_write_survives() {
        let (store, id) = seeded_store().await;
        let controller = EtagController::new();

        let stale = compute_fingerprint(&store.get(id).await.unwrap().unwrap());

        // Intervening writer.
        let (_, fresh) = controller
            .conditional_update(&store, id, Some(&stale), |spot| {
                spot.name = "Intervening".to_string();
            })
            .await
            .unwrap();
        assert_ne!(fresh, stale);

        let result = controller
            .conditional_update(&store, id, Some(&stale), |spot| {
                spot.name = "Late writer".to_string();
            })
            .await;
        assert!(matches!(result, Err(UpdateError::Conflict(_))));

        let current = store.get(id).await.unwrap().unwrap();
        assert_eq!(current.name, "Intervening");
    }

    #[tokio::test]
    async fn unknown_spot_is_not_found() {
        let store = MemorySpotStore::new();
        let controller = EtagController::new();
        let result = controller
            .conditional_update(&store, 12345, Some("anything"), |_| {})
            .await;
        assert!(matches!(result, Err(UpdateError::NotFound(12345))));
    }

    #[tokio::test]
    async fn concurrent_writers_with_same_fingerprint_serialize() {
        let (store, id) = seeded_store().await;
        let store = Arc::new(store);
        let controller = Arc::new(EtagController::new());
        let tag = compute_fingerprint(&store.get(id).await.unwrap().unwrap());

        let a = {
            let (store, controller, tag) = (store.clone(), controller.clone(), tag.clone());
            tokio::spawn(async move {
                controller
                    .conditional_update(store.as_ref(), id, Some(&tag), |spot| {
                        spot.name = "Writer A".to_string();
                    })
                    .await
            })
        };
        let b = {
            let (store, controller, tag) = (store.clone(), controller.clone(), tag.clone());
            tokio::spawn(async move {
                controller
                    .conditional_update(store.as_ref(), id, Some(&tag), |spot| {
                        spot.name = "Writer B".to_string();
                    })
                    .await
            })
        };

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert_eq!(
            1,
            [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(),
            "exactly one writer may win a fingerprint"
        );
    }
}
