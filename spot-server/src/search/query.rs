//! Search query parsing
//!
//! The raw query-parameter map becomes a typed constraint bag with an
//! explicitly enumerated set of recognized keys. Spatial values are kept as
//! the raw strings they arrived as: the geodesic layer is the numeric
//! parser, and a malformed value there triggers the documented
//! filter-skipping fallback instead of a request error.

use std::collections::HashMap;

use tracing::{debug, warn};

/// Results returned when no limit parameter is supplied.
pub const DEFAULT_LIMIT: usize = 20;

/// Query-parameter prefix for extended-info equality constraints.
const EXTENDED_INFO_PREFIX: &str = "extended_info:";

/// Whether the request carried any query parameters at all.
///
/// Drives the empty-result default explicitly: "no query" and "query
/// matching nothing" are different outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPresence {
    NoParametersSupplied,
    ParametersSupplied,
}

/// The spatial part of a query. Present only when both center coordinates
/// were supplied; `distance` stays optional (without it the bounding-box
/// filter does not run).
#[derive(Debug, Clone)]
pub struct SpatialQuery {
    pub center_latitude: String,
    pub center_longitude: String,
    pub distance: Option<String>,
}

/// Typed search constraint bag.
#[derive(Debug, Clone)]
pub struct SpotSearchQuery {
    pub presence: QueryPresence,
    pub spatial: Option<SpatialQuery>,
    /// 0 means unlimited.
    pub limit: usize,
    /// Extended-info equality constraints, handled by the store.
    pub extended_info: Vec<(String, String)>,
}

impl SpotSearchQuery {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let presence = if params.is_empty() {
            QueryPresence::NoParametersSupplied
        } else {
            QueryPresence::ParametersSupplied
        };

        let spatial = match (params.get("center_latitude"), params.get("center_longitude")) {
            (Some(lat), Some(lon)) => Some(SpatialQuery {
                center_latitude: lat.clone(),
                center_longitude: lon.clone(),
                distance: params.get("distance").cloned(),
            }),
            _ => None,
        };

        let limit = match params.get("limit") {
            None => DEFAULT_LIMIT,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) => n,
                Err(_) => {
                    warn!(limit = %raw, "Unparseable limit parameter, using default");
                    DEFAULT_LIMIT
                }
            },
        };

        let mut extended_info = Vec::new();
        for (key, value) in params {
            match key.as_str() {
                "center_latitude" | "center_longitude" | "distance" | "limit" => {}
                _ => {
                    if let Some(info_key) = key.strip_prefix(EXTENDED_INFO_PREFIX) {
                        extended_info.push((info_key.to_string(), value.clone()));
                    } else {
                        // Accepted but not part of any filter.
                        debug!(key = %key, value = %value, "Ignoring unrecognized search key");
                    }
                }
            }
        }
        extended_info.sort();

        Self {
            presence,
            spatial,
            limit,
            extended_info,
        }
    }
}
