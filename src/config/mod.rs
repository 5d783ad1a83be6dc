//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → handed to HttpServer, which derives per-middleware state
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, CacheBackend, CacheConfig, CorrelationConfig, DataTablesConfig, ErrorHandlingConfig,
    EtagConfig, HealthConfig, ListenerConfig, LogFormat, ObservabilityConfig, ReadOnlyConfig,
    SecurityHeadersConfig, TimeoutConfig, TokenBlacklistConfig, VersionConfig,
};
pub use validation::{validate_config, ValidationError};
