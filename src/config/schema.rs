//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the middleware
//! pipeline. All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the middleware pipeline.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Correlation ID propagation.
    pub correlation: CorrelationConfig,

    /// Unhandled error rendering.
    pub error_handling: ErrorHandlingConfig,

    /// Security response headers.
    pub security_headers: SecurityHeadersConfig,

    /// Bearer token blacklist.
    pub token_blacklist: TokenBlacklistConfig,

    /// Read-only mode gate.
    pub read_only: ReadOnlyConfig,

    /// ETag computation.
    pub etag: EtagConfig,

    /// API version header.
    pub version: VersionConfig,

    /// Health check endpoint.
    pub health: HealthConfig,

    /// DataTables binding and formatting.
    pub datatables: DataTablesConfig,

    /// Distributed cache backend.
    pub cache: CacheConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,

    /// Resolve the client IP from `X-Forwarded-For`. Enable only behind a
    /// trusted proxy.
    pub trust_forwarded_for: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            trust_forwarded_for: false,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Correlation ID configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Header carrying the correlation ID.
    pub header: String,

    /// Echo the correlation ID back on the response.
    pub include_in_response: bool,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            header: "X-Correlation-Id".to_string(),
            include_in_response: true,
        }
    }
}

/// Error handler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ErrorHandlingConfig {
    /// Render the HTML placeholder page for non-ajax requests.
    pub use_html_page: bool,

    /// Development mode: attach error details, honour `?throw`.
    pub development: bool,
}

impl Default for ErrorHandlingConfig {
    fn default() -> Self {
        Self {
            use_html_page: true,
            development: false,
        }
    }
}

/// Security headers configuration.
///
/// A `None` value leaves the header untouched.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityHeadersConfig {
    pub enabled: bool,
    pub frame_options: Option<String>,
    pub xss_protection: Option<String>,
    pub content_type_options: Option<String>,
    pub referrer_policy: Option<String>,
    /// Strip the `Server` header.
    pub remove_server: bool,
    /// Extra headers to set on every response.
    pub custom: BTreeMap<String, String>,
    /// Extra headers to strip from every response.
    pub remove: Vec<String>,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frame_options: Some("DENY".to_string()),
            xss_protection: Some("1; mode=block".to_string()),
            content_type_options: Some("nosniff".to_string()),
            referrer_policy: Some("strict-origin-when-cross-origin".to_string()),
            remove_server: true,
            custom: BTreeMap::new(),
            remove: Vec::new(),
        }
    }
}

/// Bearer token blacklist configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenBlacklistConfig {
    pub enabled: bool,

    /// Cache key format; `{token}` is replaced by the raw bearer token.
    pub cache_key_format: String,
}

impl Default for TokenBlacklistConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cache_key_format: "{token}".to_string(),
        }
    }
}

/// Read-only mode configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ReadOnlyConfig {
    pub enabled: bool,
}

/// ETag configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EtagConfig {
    /// Largest response body that gets hashed.
    pub max_body_bytes: usize,
}

impl Default for EtagConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 20 * 1024,
        }
    }
}

/// API version header configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VersionConfig {
    pub header: String,

    /// Version string override; defaults to the host's version, or this crate's.
    pub version: Option<String>,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            header: "x-api-version".to_string(),
            version: None,
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    pub path: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            path: "/health".to_string(),
        }
    }
}

/// DataTables binding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DataTablesConfig {
    /// Page length used when `length` is absent or unparsable.
    pub default_page_length: i32,

    /// Reject requests whose `draw` is missing or below 1.
    pub draw_validation: bool,

    /// Write additional parameters into responses.
    pub response_additional_parameters: bool,
}

impl Default for DataTablesConfig {
    fn default() -> Self {
        Self {
            default_page_length: 10,
            draw_validation: true,
            response_additional_parameters: false,
        }
    }
}

/// Cache backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

/// Distributed cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,

    /// Connection URL for the redis backend.
    pub redis_url: Option<String>,
}
