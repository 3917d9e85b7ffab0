//! Spot Repository
//!
//! The spot row and its extended-info rows are always written together in
//! one transaction, so a spot never becomes visible half-updated.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use super::{RepoError, RepoResult};
use crate::db::models::{ExtendedInfoEntry, Location, Spot, SpotCreate};

/// Store interface consumed by the concurrency controller and search.
///
/// `put` replaces the full persisted state of one spot (row plus owned
/// extended-info entries) atomically. Entry row ids are not backfilled into
/// the argument; re-read the spot to observe them.
#[async_trait]
pub trait SpotStore: Send + Sync {
    async fn get(&self, id: i64) -> RepoResult<Option<Spot>>;
    async fn put(&self, id: i64, spot: &Spot) -> RepoResult<()>;
    async fn list_all(&self) -> RepoResult<Vec<Spot>>;
    /// `list_all` narrowed by extended-info equality constraints; an empty
    /// slice is equivalent to `list_all`.
    async fn list_matching(&self, constraints: &[(String, String)]) -> RepoResult<Vec<Spot>>;
    async fn insert(&self, data: SpotCreate) -> RepoResult<Spot>;
}

// =============================================================================
// Row types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SpotRow {
    id: i64,
    name: String,
    capacity: Option<i64>,
    latitude: Option<String>,
    longitude: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    id: i64,
    spot_id: i64,
    key: String,
    value: String,
}

fn parse_decimal(raw: &str, field: &str, spot_id: i64) -> RepoResult<Decimal> {
    raw.parse::<Decimal>().map_err(|_| {
        RepoError::Corrupt(format!("spot {spot_id}: {field} {raw:?} is not a decimal"))
    })
}

fn row_to_spot(row: SpotRow, entries: Vec<ExtendedInfoEntry>) -> RepoResult<Spot> {
    let capacity = match row.capacity {
        None => None,
        Some(c) => Some(u32::try_from(c).map_err(|_| {
            RepoError::Corrupt(format!("spot {}: capacity {c} is negative", row.id))
        })?),
    };

    // A location needs both coordinates; a lone column is treated as unset.
    let location = match (&row.latitude, &row.longitude) {
        (Some(lat), Some(lon)) => Some(Location {
            latitude: parse_decimal(lat, "latitude", row.id)?,
            longitude: parse_decimal(lon, "longitude", row.id)?,
        }),
        _ => None,
    };

    Ok(Spot {
        id: row.id,
        name: row.name,
        capacity,
        location,
        extended_info: entries,
    })
}

fn entry_from_row(row: EntryRow) -> ExtendedInfoEntry {
    ExtendedInfoEntry {
        id: Some(row.id),
        key: row.key,
        value: row.value,
    }
}

// =============================================================================
// Queries
// =============================================================================

const SPOT_COLUMNS: &str = "id, name, capacity, latitude, longitude";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Spot>> {
    let sql = format!("SELECT {SPOT_COLUMNS} FROM spot WHERE id = ?");
    let row = sqlx::query_as::<_, SpotRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        return Ok(None);
    };

    let entries = sqlx::query_as::<_, EntryRow>(
        "SELECT id, spot_id, key, value FROM spot_extended_info WHERE spot_id = ? ORDER BY key",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Some(row_to_spot(
        row,
        entries.into_iter().map(entry_from_row).collect(),
    )?))
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Spot>> {
    let sql = format!("SELECT {SPOT_COLUMNS} FROM spot ORDER BY id");
    let rows = sqlx::query_as::<_, SpotRow>(&sql).fetch_all(pool).await?;

    let entry_rows = sqlx::query_as::<_, EntryRow>(
        "SELECT id, spot_id, key, value FROM spot_extended_info ORDER BY spot_id, key",
    )
    .fetch_all(pool)
    .await?;

    let mut grouped: BTreeMap<i64, Vec<ExtendedInfoEntry>> = BTreeMap::new();
    for row in entry_rows {
        grouped
            .entry(row.spot_id)
            .or_default()
            .push(entry_from_row(row));
    }

    rows.into_iter()
        .map(|row| {
            let entries = grouped.remove(&row.id).unwrap_or_default();
            row_to_spot(row, entries)
        })
        .collect()
}

/// Spots whose extended info matches every `(key, value)` constraint.
pub async fn find_matching(
    pool: &SqlitePool,
    constraints: &[(String, String)],
) -> RepoResult<Vec<Spot>> {
    if constraints.is_empty() {
        return find_all(pool).await;
    }

    let condition = "EXISTS (SELECT 1 FROM spot_extended_info e \
                     WHERE e.spot_id = s.id AND e.key = ? AND e.value = ?)";
    let conditions = vec![condition; constraints.len()].join(" AND ");
    let sql = format!(
        "SELECT s.id, s.name, s.capacity, s.latitude, s.longitude \
         FROM spot s WHERE {conditions} ORDER BY s.id"
    );

    let mut query = sqlx::query_as::<_, SpotRow>(&sql);
    for (key, value) in constraints {
        query = query.bind(key).bind(value);
    }
    let rows = query.fetch_all(pool).await?;

    let mut spots = Vec::with_capacity(rows.len());
    for row in rows {
        let entries = sqlx::query_as::<_, EntryRow>(
            "SELECT id, spot_id, key, value FROM spot_extended_info WHERE spot_id = ? ORDER BY key",
        )
        .bind(row.id)
        .fetch_all(pool)
        .await?;
        spots.push(row_to_spot(
            row,
            entries.into_iter().map(entry_from_row).collect(),
        )?);
    }
    Ok(spots)
}

pub async fn insert(pool: &SqlitePool, data: SpotCreate) -> RepoResult<Spot> {
    let mut tx = pool.begin().await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO spot (name, capacity, latitude, longitude) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&data.name)
    .bind(data.capacity.map(i64::from))
    .bind(data.location.as_ref().map(|l| l.latitude.to_string()))
    .bind(data.location.as_ref().map(|l| l.longitude.to_string()))
    .fetch_one(&mut *tx)
    .await?;

    for (key, value) in &data.extended_info {
        sqlx::query("INSERT INTO spot_extended_info (spot_id, key, value) VALUES (?, ?, ?)")
            .bind(id)
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database(format!("Failed to reload created spot {id}")))
}

/// Replace the full state of a spot in one transaction.
///
/// Entries that still carry their row id are updated in place; entries
/// without an id are inserted; rows whose id is no longer referenced are
/// deleted.
pub async fn replace(pool: &SqlitePool, id: i64, spot: &Spot) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("UPDATE spot SET name = ?, capacity = ?, latitude = ?, longitude = ? WHERE id = ?")
        .bind(&spot.name)
        .bind(spot.capacity.map(i64::from))
        .bind(spot.location.as_ref().map(|l| l.latitude.to_string()))
        .bind(spot.location.as_ref().map(|l| l.longitude.to_string()))
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Spot {id} not found")));
    }

    let kept_ids: Vec<i64> = spot.extended_info.iter().filter_map(|e| e.id).collect();
    if kept_ids.is_empty() {
        sqlx::query("DELETE FROM spot_extended_info WHERE spot_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
    } else {
        let placeholders = vec!["?"; kept_ids.len()].join(", ");
        let sql = format!(
            "DELETE FROM spot_extended_info WHERE spot_id = ? AND id NOT IN ({placeholders})"
        );
        let mut query = sqlx::query(&sql).bind(id);
        for entry_id in &kept_ids {
            query = query.bind(entry_id);
        }
        query.execute(&mut *tx).await?;
    }

    for entry in &spot.extended_info {
        match entry.id {
            Some(entry_id) => {
                sqlx::query(
                    "UPDATE spot_extended_info SET key = ?, value = ? WHERE id = ? AND spot_id = ?",
                )
                .bind(&entry.key)
                .bind(&entry.value)
                .bind(entry_id)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query(
                    "INSERT INTO spot_extended_info (spot_id, key, value) VALUES (?, ?, ?)",
                )
                .bind(id)
                .bind(&entry.key)
                .bind(&entry.value)
                .execute(&mut *tx)
                .await?;
            }
        }
    }

    tx.commit().await?;
    Ok(())
}

// =============================================================================
// SpotStore implementation
// =============================================================================

/// SQLite-backed [`SpotStore`].
#[derive(Clone)]
pub struct SqliteSpotStore {
    pool: SqlitePool,
}

impl SqliteSpotStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SpotStore for SqliteSpotStore {
    async fn get(&self, id: i64) -> RepoResult<Option<Spot>> {
        find_by_id(&self.pool, id).await
    }

    async fn put(&self, id: i64, spot: &Spot) -> RepoResult<()> {
        replace(&self.pool, id, spot).await
    }

    async fn list_all(&self) -> RepoResult<Vec<Spot>> {
        find_all(&self.pool).await
    }

    async fn list_matching(&self, constraints: &[(String, String)]) -> RepoResult<Vec<Spot>> {
        find_matching(&self.pool, constraints).await
    }

    async fn insert(&self, data: SpotCreate) -> RepoResult<Spot> {
        insert(&self.pool, data).await
    }
}
