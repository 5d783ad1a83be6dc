//! API version response header.

use axum::http::{header::InvalidHeaderName, header::InvalidHeaderValue, HeaderName, HeaderValue};
use thiserror::Error;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::VersionConfig;

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("invalid version header name: {0}")]
    Name(#[from] InvalidHeaderName),

    #[error("invalid version value: {0}")]
    Value(#[from] InvalidHeaderValue),
}

/// Version advertised on every response. Resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersion {
    pub header: HeaderName,
    pub value: HeaderValue,
}

impl ApiVersion {
    /// Config override, else this crate's own version.
    pub fn from_config(config: &VersionConfig) -> Result<Self, VersionError> {
        Self::with_fallback(config, env!("CARGO_PKG_VERSION"))
    }

    /// Config override, else `fallback`. Hosts pass their own package version.
    pub fn with_fallback(config: &VersionConfig, fallback: &str) -> Result<Self, VersionError> {
        let version = config.version.as_deref().unwrap_or(fallback);

        Ok(Self {
            header: HeaderName::from_bytes(config.header.as_bytes())?,
            value: HeaderValue::from_str(version)?,
        })
    }

    /// Adds the header unless the handler already set one.
    pub fn layer(&self) -> SetResponseHeaderLayer<HeaderValue> {
        SetResponseHeaderLayer::if_not_present(self.header.clone(), self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    #[test]
    fn test_defaults_to_crate_version() {
        let version = ApiVersion::from_config(&VersionConfig::default()).unwrap();
        assert_eq!(version.header, "x-api-version");
        assert_eq!(version.value, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_host_fallback() {
        let version = ApiVersion::with_fallback(&VersionConfig::default(), "3.1.4").unwrap();
        assert_eq!(version.value, "3.1.4");

        let config = VersionConfig {
            version: Some("9.9.9".into()),
            ..VersionConfig::default()
        };
        let version = ApiVersion::with_fallback(&config, "3.1.4").unwrap();
        assert_eq!(version.value, "9.9.9");
    }

    #[test]
    fn test_override_and_invalid() {
        let config = VersionConfig {
            header: "X-Service-Version".into(),
            version: Some("2024.1".into()),
        };
        let version = ApiVersion::from_config(&config).unwrap();
        assert_eq!(version.header, "x-service-version");
        assert_eq!(version.value, "2024.1");

        let config = VersionConfig {
            header: "bad header".into(),
            version: None,
        };
        assert!(ApiVersion::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_header_not_overwritten() {
        let version = ApiVersion::from_config(&VersionConfig {
            header: "x-api-version".into(),
            version: Some("1.2.3".into()),
        })
        .unwrap();

        let app = Router::new()
            .route("/", get(|| async { "plain" }))
            .route("/own", get(|| async { ([("x-api-version", "9.9.9")], "own") }))
            .layer(version.layer());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers()["x-api-version"], "1.2.3");

        let response = app
            .oneshot(Request::builder().uri("/own").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers()["x-api-version"], "9.9.9");
    }
}
