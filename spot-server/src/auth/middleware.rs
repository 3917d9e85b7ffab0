//! 认证中间件
//!
//! 在任何 handler 之前运行所选认证模块。
//!
//! # 跳过认证的路径
//!
//! - `OPTIONS *` (CORS 预检)
//! - 非 `/api/` 路径 (健康检查等公共路由)
//!
//! # 错误处理
//!
//! 认证失败一律返回 401 Unauthorized，不区分缺失与无效凭据。

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::AuthModule;
use crate::core::ServerState;
use crate::utils::AppError;

pub async fn require_auth(
    State(state): State<ServerState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 允许 CORS 预检的 OPTIONS 请求 (跳过认证)
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // 非 API 路由跳过认证 (让它们正常返回 404)
    if !req.uri().path().starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    match state.auth.authorize(req.headers()) {
        Ok(()) => Ok(next.run(req).await),
        Err(e) => {
            tracing::warn!(
                target: "security",
                module = state.auth.name(),
                uri = %req.uri(),
                error = %e,
                "Request rejected by auth module"
            );
            Err(AppError::Unauthorized)
        }
    }
}
