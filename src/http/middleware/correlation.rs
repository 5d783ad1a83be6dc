//! Correlation ID propagation.
//!
//! # Responsibilities
//! - Adopt the inbound correlation header as the request's trace identifier
//! - Generate a UUID v4 when the client sent none
//! - Echo the identifier on the response unless the handler already set it
//! - Run the rest of the pipeline inside a span carrying the identifier

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::CorrelationConfig;

/// Per-request trace identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(HeaderValue);

impl CorrelationId {
    pub fn generate() -> Self {
        let id = Uuid::new_v4().to_string();
        // Hyphenated UUIDs are always valid header values.
        Self(HeaderValue::from_str(&id).unwrap_or_else(|_| HeaderValue::from_static("unknown")))
    }

    pub fn as_str(&self) -> &str {
        self.0.to_str().unwrap_or("unknown")
    }

    pub fn header_value(&self) -> &HeaderValue {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access the correlation ID attached by [`correlation_id_middleware`].
pub trait CorrelationIdExt {
    fn correlation_id(&self) -> Option<&CorrelationId>;
}

impl<B> CorrelationIdExt for axum::http::Request<B> {
    fn correlation_id(&self) -> Option<&CorrelationId> {
        self.extensions().get::<CorrelationId>()
    }
}

#[derive(Debug, Clone)]
pub struct CorrelationState {
    pub header: HeaderName,
    pub include_in_response: bool,
}

impl CorrelationState {
    pub fn from_config(config: &CorrelationConfig) -> Result<Self, axum::http::header::InvalidHeaderName> {
        Ok(Self {
            header: HeaderName::from_bytes(config.header.as_bytes())?,
            include_in_response: config.include_in_response,
        })
    }
}

pub async fn correlation_id_middleware(
    State(state): State<Arc<CorrelationState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let id = req
        .headers()
        .get(&state.header)
        .filter(|v| !v.is_empty() && v.to_str().is_ok())
        .cloned()
        .map(CorrelationId)
        .unwrap_or_else(CorrelationId::generate);

    req.extensions_mut().insert(id.clone());

    let span = tracing::info_span!(
        "request",
        correlation_id = %id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    let mut response = next.run(req).instrument(span).await;

    if state.include_in_response && !response.headers().contains_key(&state.header) {
        response
            .headers_mut()
            .insert(state.header.clone(), id.header_value().clone());
    }

    response
}
