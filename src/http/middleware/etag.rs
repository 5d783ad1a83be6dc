//! Weak caching through content hashes.
//!
//! # Responsibilities
//! - Hash successful response bodies up to a size limit
//! - Answer a matching `If-None-Match` with `304 Not Modified`
//!
//! # Design Decisions
//! - Only plain 200 responses without their own `ETag` are considered
//! - A declared `Content-Length` over the limit skips buffering entirely
//! - The buffered body is either re-emitted unchanged or dropped for the 304
//! - Attached per route (`route_layer`); opt-in rather than global

use std::sync::Arc;

use axum::{
    body::{self, Body},
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha1::{Digest, Sha1};

use crate::config::EtagConfig;
use crate::error::AppError;
use crate::observability::metrics;

#[derive(Debug, Clone)]
pub struct EtagOptions {
    pub max_body_bytes: usize,
}

impl Default for EtagOptions {
    fn default() -> Self {
        Self::from_config(&EtagConfig::default())
    }
}

impl EtagOptions {
    pub fn from_config(config: &EtagConfig) -> Self {
        Self {
            max_body_bytes: config.max_body_bytes,
        }
    }
}

/// Quoted, URL-safe base64 SHA-1 of `body`.
pub fn compute_etag(body: &[u8]) -> String {
    let digest = Sha1::digest(body);
    format!("\"{}\"", URL_SAFE_NO_PAD.encode(digest))
}

pub async fn etag_middleware(
    State(options): State<Arc<EtagOptions>>,
    req: Request,
    next: Next,
) -> Response {
    let if_none_match = req.headers().get(header::IF_NONE_MATCH).cloned();
    let response = next.run(req).await;

    if response.status() != StatusCode::OK {
        metrics::record_etag("skipped_status");
        return response;
    }
    if response.headers().contains_key(header::ETAG) {
        metrics::record_etag("skipped_existing");
        return response;
    }

    let declared_len = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_len.is_some_and(|len| len > options.max_body_bytes) {
        tracing::debug!(content_length = ?declared_len, "Response too large for ETag, passing through");
        metrics::record_etag("skipped_size");
        return response;
    }

    let (mut parts, inner) = response.into_parts();
    let bytes = match body::to_bytes(inner, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(error = %err, "Failed to buffer response body for ETag");
            return AppError::internal(format!("failed to read response body: {err}")).into_response();
        }
    };

    if bytes.len() > options.max_body_bytes {
        tracing::debug!(body_len = bytes.len(), "Response too large for ETag, skipping hash");
        metrics::record_etag("skipped_size");
        return Response::from_parts(parts, Body::from(bytes));
    }

    let etag = compute_etag(&bytes);
    let Ok(etag_value) = HeaderValue::from_str(&etag) else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    if if_none_match.as_ref() == Some(&etag_value) {
        metrics::record_etag("not_modified");
        parts.status = StatusCode::NOT_MODIFIED;
        parts.headers.remove(header::CONTENT_LENGTH);
        parts.headers.insert(header::ETAG, etag_value);
        return Response::from_parts(parts, Body::empty());
    }

    metrics::record_etag("hashed");
    parts.headers.insert(header::ETAG, etag_value);
    Response::from_parts(parts, Body::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorReport;
    use axum::{http::Request, middleware::from_fn_with_state, routing::get, Router};
    use futures_util::stream;
    use tower::ServiceExt;

    const PAYLOAD: &str = r#"{"items":[1,2,3]}"#;

    fn app() -> Router {
        Router::new()
            .route("/data", get(|| async { PAYLOAD }))
            .route("/created", get(|| async { (StatusCode::CREATED, PAYLOAD) }))
            .route(
                "/tagged",
                get(|| async { ([(header::ETAG, "\"mine\"")], PAYLOAD) }),
            )
            .route("/big", get(|| async { "x".repeat(20 * 1024 + 1) }))
            .route("/limit", get(|| async { "x".repeat(20 * 1024) }))
            .route(
                "/streamed-big",
                get(|| async {
                    let chunks = vec![
                        Ok::<_, std::io::Error>("y".repeat(15 * 1024)),
                        Ok("y".repeat(15 * 1024)),
                    ];
                    Body::from_stream(stream::iter(chunks))
                }),
            )
            .route(
                "/broken",
                get(|| async {
                    let chunks = vec![
                        Ok("partial".to_string()),
                        Err(std::io::Error::other("upstream reset")),
                    ];
                    Body::from_stream(stream::iter(chunks))
                }),
            )
            .route_layer(from_fn_with_state(Arc::new(EtagOptions::default()), etag_middleware))
    }

    async fn get_with(uri: &str, if_none_match: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(tag) = if_none_match {
            builder = builder.header(header::IF_NONE_MATCH, tag);
        }
        app().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
    }

    #[test]
    fn test_compute_etag_format() {
        let tag = compute_etag(b"hello");
        assert!(tag.starts_with('"') && tag.ends_with('"'));
        // sha1("hello") = aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d
        assert_eq!(tag, "\"qvTGHdzF6KLavt4PO0gs2a6pQ00\"");
        assert!(!tag.contains('+') && !tag.contains('/') && !tag.contains('='));
    }

    #[tokio::test]
    async fn test_etag_added() {
        let response = get_with("/data", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ETAG], compute_etag(PAYLOAD.as_bytes()).as_str());

        let body = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], PAYLOAD.as_bytes());
    }

    #[tokio::test]
    async fn test_matching_tag_returns_304() {
        let tag = compute_etag(PAYLOAD.as_bytes());
        let response = get_with("/data", Some(&tag)).await;

        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(response.headers()[header::ETAG], tag.as_str());
        let body = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_stale_tag_gets_full_body() {
        let response = get_with("/data", Some("\"stale\"")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], PAYLOAD.as_bytes());
    }

    #[tokio::test]
    async fn test_non_200_and_existing_tag_untouched() {
        let response = get_with("/created", None).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().get(header::ETAG).is_none());

        let response = get_with("/tagged", Some("\"mine\"")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ETAG], "\"mine\"");
    }

    #[tokio::test]
    async fn test_size_limit() {
        let response = get_with("/limit", None).await;
        assert!(response.headers().get(header::ETAG).is_some());

        let response = get_with("/big", None).await;
        assert!(response.headers().get(header::ETAG).is_none());
        let body = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.len(), 20 * 1024 + 1);

        let response = get_with("/streamed-big", None).await;
        assert!(response.headers().get(header::ETAG).is_none());
        let body = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.len(), 30 * 1024);
    }

    #[tokio::test]
    async fn test_body_error_becomes_500() {
        let response = get_with("/broken", None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<ErrorReport>().is_some());
    }
}
