//! Search engine: bounding-box filter and distance ranking
//!
//! The bounding box is a cheap rectangular pre-filter around the requested
//! center; exact geodesic distance only enters when a limit forces ranking.
//! If the box cannot be computed the filter is skipped and every candidate
//! passes through; a broken filter must never empty the result set on its
//! own.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use tracing::warn;

use super::geodesic::{self, CLARKE_1866, GeodesicError};
use super::query::{QueryPresence, SpatialQuery, SpotSearchQuery};
use crate::db::models::{Location, Spot};

/// Bounds are compared at 8 decimal places, inclusive.
const BOUND_DECIMALS: u32 = 8;

/// Rectangular lat/long region approximating a geodesic disc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundingBox {
    pub top: Decimal,
    pub bottom: Decimal,
    pub left: Decimal,
    pub right: Decimal,
}

impl BoundingBox {
    pub fn contains(&self, location: &Location) -> bool {
        location.latitude >= self.bottom
            && location.latitude <= self.top
            && location.longitude >= self.left
            && location.longitude <= self.right
    }
}

fn to_bound(value: f64) -> Result<Decimal, GeodesicError> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(BOUND_DECIMALS))
        .ok_or(GeodesicError::NonFinite)
}

/// Compute the bounding box for a center and radius by projecting the
/// radius at bearings 0°, 90°, 180° and 270°.
pub fn bounding_box(spatial: &SpatialQuery, distance: &str) -> Result<BoundingBox, GeodesicError> {
    let lat0 = geodesic::parse_number(&spatial.center_latitude)?;
    let lon0 = geodesic::parse_number(&spatial.center_longitude)?;
    let radius = geodesic::parse_number(distance)?;

    let (_, top) = geodesic::forward(&CLARKE_1866, lon0, lat0, 0.0, radius)?;
    let (right, _) = geodesic::forward(&CLARKE_1866, lon0, lat0, 90.0, radius)?;
    let (_, bottom) = geodesic::forward(&CLARKE_1866, lon0, lat0, 180.0, radius)?;
    let (left, _) = geodesic::forward(&CLARKE_1866, lon0, lat0, 270.0, radius)?;

    Ok(BoundingBox {
        top: to_bound(top)?,
        bottom: to_bound(bottom)?,
        left: to_bound(left)?,
        right: to_bound(right)?,
    })
}

fn parse_center(spatial: &SpatialQuery) -> Option<(f64, f64)> {
    let lon = geodesic::parse_number(&spatial.center_longitude).ok()?;
    let lat = geodesic::parse_number(&spatial.center_latitude).ok()?;
    Some((lon, lat))
}

/// Geodesic distance from the center to a spot; unrankable spots sort last.
fn distance_from(center: Option<(f64, f64)>, spot: &Spot) -> f64 {
    let Some((center_lon, center_lat)) = center else {
        return f64::INFINITY;
    };
    let Some(location) = &spot.location else {
        return f64::INFINITY;
    };
    let (Some(lon), Some(lat)) = (location.longitude.to_f64(), location.latitude.to_f64()) else {
        return f64::INFINITY;
    };
    geodesic::inverse(&CLARKE_1866, lon, lat, center_lon, center_lat).unwrap_or(f64::INFINITY)
}

/// Filter and rank `candidates` according to `query`.
///
/// Extended-info constraints are a store concern and are expected to have
/// narrowed `candidates` already; this function only handles the spatial
/// part and the limit.
pub fn search(candidates: Vec<Spot>, query: &SpotSearchQuery) -> Vec<Spot> {
    if query.presence == QueryPresence::NoParametersSupplied {
        return Vec::new();
    }
    // Without a spatial anchor there is nothing meaningful to search.
    let Some(spatial) = &query.spatial else {
        return Vec::new();
    };

    let mut hits = match &spatial.distance {
        Some(distance) => match bounding_box(spatial, distance) {
            Ok(bbox) => candidates
                .into_iter()
                .filter(|spot| spot.location.as_ref().is_some_and(|loc| bbox.contains(loc)))
                .collect(),
            Err(err) => {
                warn!(error = %err, "Bounding-box computation failed, skipping spatial filter");
                candidates
            }
        },
        None => candidates,
    };

    if query.limit > 0 && hits.len() > query.limit {
        let center = parse_center(spatial);
        let mut ranked: Vec<(f64, Spot)> = hits
            .into_iter()
            .map(|spot| (distance_from(center, &spot), spot))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits = ranked
            .into_iter()
            .take(query.limit)
            .map(|(_, spot)| spot)
            .collect();
    }

    hits
}
