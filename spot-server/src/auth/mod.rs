//! 认证模块
//!
//! Authentication is a swappable module chosen once at startup via
//! `AUTH_MODULE`; every module is a pass/fail gate over the request
//! headers, nothing more. Handlers never see which module is active.

pub mod middleware;

use enum_dispatch::enum_dispatch;
use http::HeaderMap;
use thiserror::Error;

use crate::core::Config;

pub use middleware::require_auth;

/// Header checked by the [`ApiKey`] module.
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingCredentials,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unknown auth module: {0:?}")]
    UnknownModule(String),

    #[error("AUTH_MODULE=api_key requires API_KEY to be set")]
    MissingApiKey,
}

/// A pluggable authentication module.
#[enum_dispatch]
pub trait AuthModule {
    /// Pass/fail gate over the request headers.
    fn authorize(&self, headers: &HeaderMap) -> Result<(), AuthError>;

    /// Module name as used in configuration.
    fn name(&self) -> &'static str;
}

/// Admits every request. The default, matching open deployments and tests.
#[derive(Debug, Clone, Default)]
pub struct AllOk;

impl AuthModule for AllOk {
    fn authorize(&self, _headers: &HeaderMap) -> Result<(), AuthError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "all_ok"
    }
}

/// Requires a matching `x-api-key` header.
#[derive(Debug, Clone)]
pub struct ApiKey {
    key: String,
}

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl AuthModule for ApiKey {
    fn authorize(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let presented = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingCredentials)?;
        if presented != self.key {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "api_key"
    }
}

/// The module selected for this process. Static dispatch via enum_dispatch;
/// selection happens exactly once, at startup.
#[enum_dispatch(AuthModule)]
#[derive(Debug, Clone)]
pub enum Authenticator {
    AllOk,
    ApiKey,
}

impl Authenticator {
    pub fn from_config(config: &Config) -> Result<Self, AuthError> {
        match config.auth_module.as_str() {
            "all_ok" => Ok(AllOk.into()),
            "api_key" => {
                let key = config
                    .api_key
                    .as_deref()
                    .filter(|k| !k.is_empty())
                    .ok_or(AuthError::MissingApiKey)?;
                Ok(ApiKey::new(key).into())
            }
            other => Err(AuthError::UnknownModule(other.to_string())),
        }
    }
}
