//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Header names and values must be valid HTTP tokens
//! - Value ranges (page length, body limits, timeouts)
//! - Backend-specific requirements (redis URL)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::schema::{AppConfig, CacheBackend};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate the configuration, collecting every violation.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be > 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address when metrics are enabled",
        ));
    }

    check_header_name(&mut errors, "correlation.header", &config.correlation.header);
    check_header_name(&mut errors, "version.header", &config.version.header);

    if let Some(version) = &config.version.version {
        if HeaderValue::from_str(version).is_err() {
            errors.push(ValidationError::new("version.version", "not a valid header value"));
        }
    }

    let headers = &config.security_headers;
    for (field, value) in [
        ("security_headers.frame_options", &headers.frame_options),
        ("security_headers.xss_protection", &headers.xss_protection),
        ("security_headers.content_type_options", &headers.content_type_options),
        ("security_headers.referrer_policy", &headers.referrer_policy),
    ] {
        if let Some(value) = value {
            check_header_value(&mut errors, field, value);
        }
    }
    for (name, value) in &headers.custom {
        let field = format!("security_headers.custom.{name}");
        check_header_name(&mut errors, &field, name);
        check_header_value(&mut errors, &field, value);
    }
    for name in &headers.remove {
        check_header_name(&mut errors, "security_headers.remove", name);
    }

    if !config.token_blacklist.cache_key_format.contains("{token}") {
        errors.push(ValidationError::new(
            "token_blacklist.cache_key_format",
            "must contain the {token} placeholder",
        ));
    }

    if config.etag.max_body_bytes == 0 {
        errors.push(ValidationError::new("etag.max_body_bytes", "must be > 0"));
    }

    if !config.health.path.starts_with('/') {
        errors.push(ValidationError::new("health.path", "must start with '/'"));
    }

    // DataTables uses -1 for "all rows"
    let page_length = config.datatables.default_page_length;
    if page_length == 0 || page_length < -1 {
        errors.push(ValidationError::new(
            "datatables.default_page_length",
            "must be > 0 or -1",
        ));
    }

    if config.cache.backend == CacheBackend::Redis && config.cache.redis_url.is_none() {
        errors.push(ValidationError::new(
            "cache.redis_url",
            "required when cache.backend = \"redis\"",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_header_name(errors: &mut Vec<ValidationError>, field: &str, name: &str) {
    if HeaderName::from_bytes(name.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            field,
            format!("'{name}' is not a valid header name"),
        ));
    }
}

fn check_header_value(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if HeaderValue::from_str(value).is_err() {
        errors.push(ValidationError::new(field, "not a valid header value"));
    }
}
