//! Spot API Handlers
//!
//! GET serves the resource with its fingerprint in the `ETag` header; PUT
//! only succeeds when `If-Match` carries the current fingerprint. The
//! search endpoint never fails on client input: bad queries yield an
//! empty array.

use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::core::ServerState;
use crate::db::models::{SpotCreate, SpotJson, SpotUpdate};
use crate::db::repository::SpotStore;
use crate::etag::compute_fingerprint;
use crate::search::{self, SpotSearchQuery};
use crate::utils::validation::{
    MAX_NAME_LEN, validate_extended_info, validate_location, validate_required_text,
};
use crate::utils::{AppError, AppResult};

/// Non-numeric ids fall outside the id space, so they are "not found"
/// rather than "bad request".
fn parse_spot_id(raw: &str) -> AppResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| AppError::not_found(format!("Spot {raw} not found")))
}

/// `If-Match` value with one layer of surrounding quotes stripped.
fn if_match_fingerprint(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::IF_MATCH)?.to_str().ok()?.trim();
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);
    Some(unquoted.to_string())
}

fn validate_create(payload: &SpotCreate) -> AppResult<()> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_location(&payload.location)?;
    validate_extended_info(payload.extended_info.iter())?;
    Ok(())
}

fn validate_update(payload: &SpotUpdate) -> AppResult<()> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_location(&payload.location)?;
    validate_extended_info(payload.extended_info.iter())?;
    Ok(())
}

// =============================================================================
// Spot Handlers
// =============================================================================

/// GET /api/v1/spot/:id - 获取单个 Spot (带 ETag)
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id = parse_spot_id(&id)?;
    let spot = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Spot {id} not found")))?;

    let etag = compute_fingerprint(&spot);
    Ok((
        StatusCode::OK,
        [(header::ETAG, etag)],
        Json(SpotJson::from(spot)),
    )
        .into_response())
}

/// PUT /api/v1/spot/:id - 条件更新 (要求 If-Match)
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let id = parse_spot_id(&id)?;

    // Unknown ids are rejected before the body is even looked at; there is
    // no PUT-to-create.
    if state.store.get(id).await?.is_none() {
        return Err(AppError::not_found(format!("Spot {id} not found")));
    }

    let payload: SpotUpdate = serde_json::from_slice(&body)
        .map_err(|e| AppError::validation(format!("Invalid JSON body: {e}")))?;
    validate_update(&payload)?;

    let expected = if_match_fingerprint(&headers);
    let (spot, etag) = state
        .etags
        .conditional_update(&state.store, id, expected.as_deref(), |spot| {
            spot.apply_update(payload)
        })
        .await?;

    tracing::info!(id, "Spot updated");
    Ok((
        StatusCode::OK,
        [(header::ETAG, etag)],
        Json(SpotJson::from(spot)),
    )
        .into_response())
}

/// POST /api/v1/spot - 创建 Spot
pub async fn create(State(state): State<ServerState>, body: Bytes) -> AppResult<Response> {
    let payload: SpotCreate = serde_json::from_slice(&body)
        .map_err(|e| AppError::validation(format!("Invalid JSON body: {e}")))?;
    validate_create(&payload)?;

    let spot = state.store.insert(payload).await?;
    let etag = compute_fingerprint(&spot);

    tracing::info!(id = spot.id, "Spot created");
    Ok((
        StatusCode::CREATED,
        [
            (header::ETAG, etag),
            (header::LOCATION, format!("/api/v1/spot/{}", spot.id)),
        ],
        Json(SpotJson::from(spot)),
    )
        .into_response())
}

/// GET /api/v1/spot - 搜索 (bounding box + 距离排序)
pub async fn search(
    State(state): State<ServerState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<Vec<SpotJson>>> {
    let query = SpotSearchQuery::from_params(&params);
    if query.presence == search::QueryPresence::NoParametersSupplied {
        return Ok(Json(Vec::new()));
    }

    let candidates = state.store.list_matching(&query.extended_info).await?;
    let hits = search::search(candidates, &query);

    Ok(Json(hits.into_iter().map(SpotJson::from).collect()))
}
