//! Spot API 模块

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/api/v1/spot",
            get(handler::search).post(handler::create),
        )
        .route(
            "/api/v1/spot/{id}",
            get(handler::get_by_id).put(handler::update),
        )
}
