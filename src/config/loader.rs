//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.correlation.header, "X-Correlation-Id");
        assert_eq!(config.etag.max_body_bytes, 20 * 1024);
        assert_eq!(config.datatables.default_page_length, 10);
        assert!(config.datatables.draw_validation);
        assert!(!config.read_only.enabled);
    }

    #[test]
    fn test_partial_sections() {
        let config = parse_config(
            r#"
            [read_only]
            enabled = true

            [token_blacklist]
            enabled = true
            cache_key_format = "revoked:{token}"

            [version]
            header = "x-build"
            version = "2024.1"
            "#,
        )
        .unwrap();

        assert!(config.read_only.enabled);
        assert_eq!(config.token_blacklist.cache_key_format, "revoked:{token}");
        assert_eq!(config.version.header, "x-build");
        assert_eq!(config.version.version.as_deref(), Some("2024.1"));
        // Untouched sections keep defaults
        assert_eq!(config.health.path, "/health");
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[read_only]\nenabled = \"maybe\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_surfaces() {
        let err = parse_config("[health]\npath = \"health\"").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
