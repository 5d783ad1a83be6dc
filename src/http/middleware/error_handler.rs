//! Unhandled error rendering.
//!
//! # Responsibilities
//! - Catch failures from the inner pipeline: responses tagged with an
//!   [`ErrorReport`] and panics
//! - Map domain error codes to HTTP statuses through a pluggable [`CodeMap`]
//! - Render a JSON body (or the HTML placeholder for browser requests)
//! - Mark the error response as uncacheable
//! - Offer RFC 7807 problem details for plain status responses
//!
//! # Design Decisions
//! - A response whose body was already produced is never rewritten
//! - If rendering the error itself fails, the original failure is propagated

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::FutureExt;
use serde::Serialize;

use crate::config::ErrorHandlingConfig;
use crate::error::ErrorReport;
use crate::http::middleware::correlation::{CorrelationId, CorrelationIdExt};
use crate::observability::metrics;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Maps domain error codes to HTTP statuses.
pub trait CodeMap: Send + Sync {
    fn map_error_code(&self, code: i32) -> Option<StatusCode>;
}

impl<F> CodeMap for F
where
    F: Fn(i32) -> Option<StatusCode> + Send + Sync,
{
    fn map_error_code(&self, code: i32) -> Option<StatusCode> {
        self(code)
    }
}

#[derive(Clone, Default)]
pub struct ErrorHandlerState {
    pub use_html_page: bool,
    pub development: bool,
    pub code_map: Option<Arc<dyn CodeMap>>,
}

impl ErrorHandlerState {
    pub fn from_config(config: &ErrorHandlingConfig) -> Self {
        Self {
            use_html_page: config.use_html_page,
            development: config.development,
            code_map: None,
        }
    }

    pub fn with_code_map(mut self, code_map: impl CodeMap + 'static) -> Self {
        self.code_map = Some(Arc::new(code_map));
        self
    }

    fn status_for(&self, code: Option<i32>) -> StatusCode {
        code.and_then(|code| self.code_map.as_ref()?.map_error_code(code))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// JSON error body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub request_id: String,
    /// -1 when the failure carried no domain code.
    pub error_code: i32,
    pub error_message: String,
    pub is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ErrorResponse {
    pub fn new(request_id: impl Into<String>, error_code: Option<i32>, error_message: impl Into<String>) -> Self {
        let error_code = error_code.unwrap_or(-1);
        Self {
            request_id: request_id.into(),
            error_code,
            error_message: error_message.into(),
            is_error: error_code > 0,
            details: None,
            errors: Vec::new(),
        }
    }
}

/// Development-only diagnostics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub stack_trace: String,
    pub request_path: String,
    pub query_string: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field_name: String,
    pub error_message: String,
}

/// 400 response listing per-field validation failures.
#[derive(Debug, Clone)]
pub struct ValidationErrorResponse {
    request_id: Option<CorrelationId>,
    error_code: i32,
    error_message: String,
    errors: Vec<FieldError>,
}

impl ValidationErrorResponse {
    pub const DEFAULT_CODE: i32 = 4000;
    pub const DEFAULT_MESSAGE: &'static str = "Validation failed.";

    pub fn new() -> Self {
        Self {
            request_id: None,
            error_code: Self::DEFAULT_CODE,
            error_message: Self::DEFAULT_MESSAGE.to_string(),
            errors: Vec::new(),
        }
    }

    pub fn code(mut self, code: i32) -> Self {
        self.error_code = code;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    pub fn request_id(mut self, id: CorrelationId) -> Self {
        self.request_id = Some(id);
        self
    }

    pub fn field(mut self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors.push(FieldError {
            field_name: name.into(),
            error_message: message.into(),
        });
        self
    }
}

impl Default for ValidationErrorResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        let request_id = self
            .request_id
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        let mut body = ErrorResponse::new(request_id, Some(self.error_code), self.error_message);
        body.errors = self.errors;

        (StatusCode::BAD_REQUEST, axum::Json(body)).into_response()
    }
}

const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// RFC 7807 problem details for a bare HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCodeProblemDetails {
    #[serde(rename = "type")]
    pub type_uri: String,
    pub title: Option<String>,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StatusCodeProblemDetails {
    /// Type points at the status reference page; title is the reason phrase.
    pub fn new(status: StatusCode) -> Self {
        Self {
            type_uri: format!("https://httpstatuses.com/{}", status.as_u16()),
            title: status.canonical_reason().map(str::to_string),
            status: status.as_u16(),
            detail: None,
        }
    }

    pub fn with_title(status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::new(status)
        }
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl IntoResponse for StatusCodeProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match serde_json::to_vec(&self) {
            Ok(body) => (
                status,
                [(header::CONTENT_TYPE, HeaderValue::from_static(PROBLEM_CONTENT_TYPE))],
                body,
            )
                .into_response(),
            Err(err) => {
                tracing::error!(error = %err, "Failed to serialize problem details");
                status.into_response()
            }
        }
    }
}

/// Request facts captured before the request is handed downstream.
struct RequestContext {
    request_id: String,
    path: String,
    query: String,
    wants_json: bool,
    throw_requested: bool,
}

impl RequestContext {
    fn capture(req: &Request) -> Self {
        let headers = req.headers();
        let query = req.uri().query().unwrap_or_default().to_string();
        Self {
            request_id: req
                .correlation_id()
                .map(ToString::to_string)
                .unwrap_or_default(),
            path: req.uri().path().to_string(),
            throw_requested: query
                .split('&')
                .any(|pair| pair.split('=').next() == Some("throw")),
            query,
            wants_json: is_ajax(headers),
        }
    }
}

fn is_ajax(headers: &HeaderMap) -> bool {
    let equals = |name: header::HeaderName, expected: &str| {
        headers.get(name).is_some_and(|v| v.as_bytes() == expected.as_bytes())
    };
    equals(header::HeaderName::from_static("x-requested-with"), "XMLHttpRequest")
        || equals(header::ACCEPT, JSON_CONTENT_TYPE)
        || equals(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
}

/// The failure as it surfaced from downstream.
enum Failure {
    Response(Response),
    Panic(Box<dyn Any + Send>),
}

pub async fn error_handler_middleware(
    State(state): State<Arc<ErrorHandlerState>>,
    req: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::capture(&req);

    if state.development && ctx.throw_requested {
        let report = ErrorReport {
            code: None,
            message: "Generic test error.".to_string(),
            trace: vec!["raised by ?throw".to_string()],
        };
        let failure = Failure::Response(StatusCode::INTERNAL_SERVER_ERROR.into_response());
        return handle_failure(&state, &ctx, report, failure);
    }

    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => match response.extensions().get::<ErrorReport>().cloned() {
            Some(report) => handle_failure(&state, &ctx, report, Failure::Response(response)),
            None => response,
        },
        Err(payload) => {
            let report = ErrorReport::from_panic(payload.as_ref());
            metrics::record_unhandled_error("panic");
            handle_failure(&state, &ctx, report, Failure::Panic(payload))
        }
    }
}

fn handle_failure(
    state: &ErrorHandlerState,
    ctx: &RequestContext,
    report: ErrorReport,
    failure: Failure,
) -> Response {
    tracing::error!(
        request_id = %ctx.request_id,
        error_code = ?report.code,
        error = %report.message,
        "An unhandled error has occurred"
    );

    let failure = match failure {
        Failure::Response(response) => {
            metrics::record_unhandled_error("error");
            // Output already produced downstream cannot be taken back.
            if response.body().size_hint().exact() != Some(0) {
                tracing::warn!("The response has already started, the error handler will not be executed");
                return response;
            }
            Failure::Response(response)
        }
        panic => panic,
    };

    recover(render(state, ctx, &report), failure)
}

fn render(
    state: &ErrorHandlerState,
    ctx: &RequestContext,
    report: &ErrorReport,
) -> Result<Response, serde_json::Error> {
    let status = state.status_for(report.code);

    let mut response = if !state.use_html_page || ctx.wants_json {
        let mut body = ErrorResponse::new(ctx.request_id.clone(), report.code, report.message.clone());
        if state.development {
            body.details = Some(ErrorDetails {
                stack_trace: report.trace.join("\n"),
                request_path: ctx.path.clone(),
                query_string: if ctx.query.is_empty() {
                    String::new()
                } else {
                    format!("?{}", ctx.query)
                },
            });
        }

        let bytes = serde_json::to_vec(&body)?;
        (
            [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
            Body::from(bytes),
        )
            .into_response()
    } else {
        (
            [(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"))],
            "Error.",
        )
            .into_response()
    };

    *response.status_mut() = status;
    clear_cache_headers(response.headers_mut());
    Ok(response)
}

fn clear_cache_headers(headers: &mut HeaderMap) {
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("-1"));
    headers.remove(header::ETAG);
}

/// Fall back to the original failure when the error body cannot be rendered.
fn recover(rendered: Result<Response, serde_json::Error>, failure: Failure) -> Response {
    match rendered {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(error = %err, "An error was thrown attempting to display the error page");
            match failure {
                Failure::Response(response) => response,
                Failure::Panic(payload) => std::panic::resume_unwind(payload),
            }
        }
    }
}
