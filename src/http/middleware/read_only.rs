//! Read-only mode gate.
//!
//! While enabled, only `GET` and `OPTIONS` reach the application.

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::forwarded::ClientIp;
use crate::observability::metrics;

pub const READ_ONLY_MESSAGE: &str = "Application is currently in read only mode.";

pub async fn read_only_middleware(req: Request, next: Next) -> Response {
    if req.method() == Method::GET || req.method() == Method::OPTIONS {
        return next.run(req).await;
    }

    let client_ip = req.extensions().get::<ClientIp>().map(|ClientIp(ip)| *ip);
    tracing::debug!(
        method = %req.method(),
        path = %req.uri().path(),
        client_ip = ?client_ip,
        "Rejected write in read only mode"
    );
    metrics::record_read_only_rejection();

    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))],
        READ_ONLY_MESSAGE,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, middleware::from_fn, routing::any, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/", any(|| async { "inner" }))
            .layer(from_fn(read_only_middleware))
    }

    async fn call(method: Method) -> (StatusCode, String) {
        let response = app()
            .oneshot(Request::builder().method(method).uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_reads_pass() {
        assert_eq!(call(Method::GET).await, (StatusCode::OK, "inner".to_string()));
        assert_eq!(call(Method::OPTIONS).await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_writes_rejected() {
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH, Method::HEAD] {
            let (status, body) = call(method.clone()).await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{method}");
            if method != Method::HEAD {
                assert_eq!(body, READ_ONLY_MESSAGE);
            }
        }
    }

    #[tokio::test]
    async fn test_content_type() {
        let response = app()
            .oneshot(Request::builder().method(Method::POST).uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    }
}
