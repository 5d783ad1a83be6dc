//! Application error type returned by handlers and middleware.
//!
//! An [`AppError`] does not render itself. Its response is a bare 500 tagged
//! with an [`ErrorReport`] extension; the error handler middleware picks the
//! report up, maps the status and writes the body.

use std::error::Error as _;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::cache::CacheError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Application-level failure carrying a numeric error code.
    #[error("{message}")]
    Domain { code: i32, message: String },

    #[error("{0}")]
    Internal(String),

    #[error("cache unavailable: {0}")]
    Cache(#[from] CacheError),
}

impl AppError {
    pub fn domain(code: i32, message: impl Into<String>) -> Self {
        Self::Domain {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Domain error code, if any.
    pub fn error_code(&self) -> Option<i32> {
        match self {
            Self::Domain { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn report(&self) -> ErrorReport {
        let mut trace = vec![format!("{self:?}")];
        let mut source = self.source();
        while let Some(err) = source {
            trace.push(err.to_string());
            source = err.source();
        }

        ErrorReport {
            code: self.error_code(),
            message: self.to_string(),
            trace,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(self.report());
        response
    }
}

/// Snapshot of a failure, carried in response extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub code: Option<i32>,
    pub message: String,
    /// Debug rendering followed by the source chain.
    pub trace: Vec<String>,
}

impl ErrorReport {
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with non-string payload".to_string()
        };

        Self {
            code: None,
            trace: vec![format!("panicked: {message}")],
            message,
        }
    }
}
