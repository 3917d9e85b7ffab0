//! In-memory [`SpotStore`] for unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;

use super::{RepoError, RepoResult, SpotStore};
use crate::db::models::{ExtendedInfoEntry, Spot, SpotCreate};

#[derive(Default)]
pub struct MemorySpotStore {
    spots: Mutex<BTreeMap<i64, Spot>>,
    next_spot_id: AtomicI64,
    next_entry_id: AtomicI64,
}

impl MemorySpotStore {
    pub fn new() -> Self {
        Self {
            spots: Mutex::new(BTreeMap::new()),
            next_spot_id: AtomicI64::new(1),
            next_entry_id: AtomicI64::new(1),
        }
    }

    fn assign_entry_ids(&self, entries: &mut [ExtendedInfoEntry]) {
        for entry in entries {
            if entry.id.is_none() {
                entry.id = Some(self.next_entry_id.fetch_add(1, Ordering::SeqCst));
            }
        }
    }
}

#[async_trait]
impl SpotStore for MemorySpotStore {
    async fn get(&self, id: i64) -> RepoResult<Option<Spot>> {
        Ok(self.spots.lock().unwrap().get(&id).cloned())
    }

    async fn put(&self, id: i64, spot: &Spot) -> RepoResult<()> {
        let mut spots = self.spots.lock().unwrap();
        if !spots.contains_key(&id) {
            return Err(RepoError::NotFound(format!("Spot {id} not found")));
        }
        let mut stored = spot.clone();
        self.assign_entry_ids(&mut stored.extended_info);
        spots.insert(id, stored);
        Ok(())
    }

    async fn list_all(&self) -> RepoResult<Vec<Spot>> {
        Ok(self.spots.lock().unwrap().values().cloned().collect())
    }

    async fn list_matching(&self, constraints: &[(String, String)]) -> RepoResult<Vec<Spot>> {
        let all = self.list_all().await?;
        Ok(all
            .into_iter()
            .filter(|spot| {
                constraints.iter().all(|(key, value)| {
                    spot.extended_info
                        .iter()
                        .any(|e| &e.key == key && &e.value == value)
                })
            })
            .collect())
    }

    async fn insert(&self, data: SpotCreate) -> RepoResult<Spot> {
        let id = self.next_spot_id.fetch_add(1, Ordering::SeqCst);
        let mut extended_info: Vec<ExtendedInfoEntry> = data
            .extended_info
            .into_iter()
            .map(|(key, value)| ExtendedInfoEntry::new(key, value))
            .collect();
        self.assign_entry_ids(&mut extended_info);

        let spot = Spot {
            id,
            name: data.name,
            capacity: data.capacity,
            location: data.location,
            extended_info,
        };
        self.spots.lock().unwrap().insert(id, spot.clone());
        Ok(spot)
    }
}
