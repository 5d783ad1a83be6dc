//! Liveness endpoint.

use axum::{routing::get, Router};

pub async fn health_check() -> &'static str {
    "OK"
}

/// Router exposing [`health_check`] at `path`.
pub fn health_routes<S: Clone + Send + Sync + 'static>(path: &str) -> Router<S> {
    Router::new().route(path, get(health_check))
}
