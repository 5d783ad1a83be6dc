//! Revoked bearer token gate.
//!
//! Rejects requests whose bearer token has been written to the distributed
//! cache. Revocation is a plain `set` under the configured key, so any node
//! sharing the cache sees it on the next request.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::cache::{CacheError, DistributedCache};
use crate::config::TokenBlacklistConfig;
use crate::error::AppError;
use crate::http::forwarded::ClientIp;
use crate::observability::metrics;

const TOKEN_PLACEHOLDER: &str = "{token}";
const BEARER: &str = "Bearer";

#[derive(Clone)]
pub struct TokenBlacklistState {
    pub cache: Arc<dyn DistributedCache>,
    pub key_format: String,
}

impl TokenBlacklistState {
    pub fn new(cache: Arc<dyn DistributedCache>, config: &TokenBlacklistConfig) -> Self {
        Self {
            cache,
            key_format: config.cache_key_format.clone(),
        }
    }
}

/// Raw bearer token from `Authorization`, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix(BEARER).unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

pub fn cache_key(format: &str, token: &str) -> String {
    format.replace(TOKEN_PLACEHOLDER, token)
}

/// Blacklist `token` until `ttl` elapses (forever when `None`).
pub async fn revoke_token(
    cache: &dyn DistributedCache,
    key_format: &str,
    token: &str,
    ttl: Option<Duration>,
) -> Result<(), CacheError> {
    cache.set(&cache_key(key_format, token), b"revoked".to_vec(), ttl).await
}

pub async fn token_blacklist_middleware(
    State(state): State<Arc<TokenBlacklistState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = match bearer_token(req.headers()) {
        Some(token) => cache_key(&state.key_format, token),
        None => return Ok(next.run(req).await),
    };

    if state.cache.get(&key).await?.is_some() {
        let client_ip = req.extensions().get::<ClientIp>().map(|ClientIp(ip)| *ip);
        tracing::info!(path = %req.uri().path(), client_ip = ?client_ip, "Rejected blacklisted bearer token");
        metrics::record_blacklist_rejection();
        return Ok(StatusCode::FORBIDDEN.into_response());
    }

    Ok(next.run(req).await)
}
