//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode},
    middleware::from_fn_with_state,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::ServiceExt;

use middleware_kit::cache::{DistributedCache, MemoryCache};
use middleware_kit::config::AppConfig;
use middleware_kit::http::demo::{demo_routes, DemoTable, DEMO_NOT_FOUND};
use middleware_kit::http::middleware::etag_middleware;
use middleware_kit::HttpServer;

/// Default config with the HTML error page off so errors render as JSON.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.error_handling.use_html_page = false;
    config
}

/// Server with the demo routes mounted (grid wrapped by the ETag filter).
pub fn test_server(config: AppConfig, cache: Arc<dyn DistributedCache>) -> HttpServer {
    let server = HttpServer::new(config, cache)
        .expect("valid test config")
        .with_code_map(|code: i32| (code == DEMO_NOT_FOUND).then_some(StatusCode::NOT_FOUND));
    let demo = demo_routes(DemoTable::seeded())
        .route_layer(from_fn_with_state(server.etag_options(), etag_middleware));
    server.with_routes(demo)
}

pub fn test_router(config: AppConfig) -> Router {
    test_server(config, Arc::new(MemoryCache::new())).into_router()
}

pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body)
}

pub fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

/// Serve on an ephemeral port; drop or send on the handle to stop.
pub async fn spawn_server(server: HttpServer) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let _ = server
            .run_until(listener, async {
                let _ = rx.await;
            })
            .await;
    });

    (addr, tx)
}

/// Urlencoded `key=value` pairs; brackets in keys are percent-encoded.
pub fn encode(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k.replace('[', "%5B").replace(']', "%5D"), v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Parameters describing the demo grid's four columns.
pub fn grid_columns() -> String {
    ["id", "name", "region", "status"]
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let data = format!("columns[{i}][data]");
            let searchable = format!("columns[{i}][searchable]");
            let orderable = format!("columns[{i}][orderable]");
            encode(&[
                (data.as_str(), *field),
                (searchable.as_str(), "true"),
                (orderable.as_str(), "true"),
            ])
        })
        .collect::<Vec<_>>()
        .join("&")
}
