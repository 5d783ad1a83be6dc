//! Security response headers.
//!
//! # Responsibilities
//! - Hold a policy of headers to set and headers to strip
//! - Build policies fluently, starting from a secure default
//! - Apply the policy to every response on its way out
//!
//! # Design Decisions
//! - Header values are validated once, when the policy is built
//! - Set headers overwrite whatever the handler wrote

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        header::{self, InvalidHeaderName, InvalidHeaderValue},
        HeaderMap, HeaderName, HeaderValue,
    },
    middleware::Next,
    response::Response,
};
use thiserror::Error;

use crate::config::SecurityHeadersConfig;

const FRAME_OPTIONS: HeaderName = HeaderName::from_static("x-frame-options");
const XSS_PROTECTION: HeaderName = HeaderName::from_static("x-xss-protection");

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid header name: {0}")]
    Name(#[from] InvalidHeaderName),

    #[error("invalid header value: {0}")]
    Value(#[from] InvalidHeaderValue),
}

/// Headers to set and headers to strip on every response.
#[derive(Debug, Clone, Default)]
pub struct SecurityHeadersPolicy {
    pub set: HeaderMap,
    pub remove: Vec<HeaderName>,
}

impl SecurityHeadersPolicy {
    pub fn builder() -> SecurityHeadersBuilder {
        SecurityHeadersBuilder::default()
    }

    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.set {
            headers.insert(name.clone(), value.clone());
        }
        for name in &self.remove {
            headers.remove(name);
        }
    }

    pub fn from_config(config: &SecurityHeadersConfig) -> Result<Self, PolicyError> {
        let mut builder = SecurityHeadersBuilder::default();

        let configured = [
            (FRAME_OPTIONS, &config.frame_options),
            (XSS_PROTECTION, &config.xss_protection),
            (header::X_CONTENT_TYPE_OPTIONS, &config.content_type_options),
            (header::REFERRER_POLICY, &config.referrer_policy),
        ];
        for (name, value) in configured {
            if let Some(value) = value {
                builder.policy.set.insert(name, HeaderValue::from_str(value)?);
            }
        }

        for (name, value) in &config.custom {
            builder = builder.add_custom_header(name, value)?;
        }
        if config.remove_server {
            builder = builder.remove_server_header();
        }
        for name in &config.remove {
            builder = builder.remove_header(name)?;
        }

        Ok(builder.build())
    }
}

/// Fluent construction of a [`SecurityHeadersPolicy`].
#[derive(Debug, Clone, Default)]
pub struct SecurityHeadersBuilder {
    policy: SecurityHeadersPolicy,
}

impl SecurityHeadersBuilder {
    /// Frame denial, XSS blocking, nosniff, no `Server` header.
    pub fn add_default_secure_policy(self) -> Self {
        self.add_frame_options_deny()
            .add_xss_protection_block()
            .add_content_type_options_no_sniff()
            .remove_server_header()
    }

    fn set(mut self, name: HeaderName, value: &'static str) -> Self {
        self.policy.set.insert(name, HeaderValue::from_static(value));
        self
    }

    pub fn add_frame_options_deny(self) -> Self {
        self.set(FRAME_OPTIONS, "DENY")
    }

    pub fn add_frame_options_same_origin(self) -> Self {
        self.set(FRAME_OPTIONS, "SAMEORIGIN")
    }

    pub fn add_frame_options_allow_from(mut self, uri: &str) -> Result<Self, PolicyError> {
        let value = HeaderValue::from_str(&format!("ALLOW-FROM {uri}"))?;
        self.policy.set.insert(FRAME_OPTIONS, value);
        Ok(self)
    }

    pub fn add_xss_protection_enabled(self) -> Self {
        self.set(XSS_PROTECTION, "1")
    }

    pub fn add_xss_protection_disabled(self) -> Self {
        self.set(XSS_PROTECTION, "0")
    }

    pub fn add_xss_protection_block(self) -> Self {
        self.set(XSS_PROTECTION, "1; mode=block")
    }

    pub fn add_xss_protection_report(mut self, report_url: &str) -> Result<Self, PolicyError> {
        let value = HeaderValue::from_str(&format!("1; report={report_url}"))?;
        self.policy.set.insert(XSS_PROTECTION, value);
        Ok(self)
    }

    pub fn add_content_type_options_no_sniff(self) -> Self {
        self.set(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
    }

    pub fn add_referrer_policy_no_referrer(self) -> Self {
        self.set(header::REFERRER_POLICY, "no-referrer")
    }

    pub fn add_referrer_policy_no_referrer_when_downgrade(self) -> Self {
        self.set(header::REFERRER_POLICY, "no-referrer-when-downgrade")
    }

    pub fn add_referrer_policy_origin(self) -> Self {
        self.set(header::REFERRER_POLICY, "origin")
    }

    pub fn add_referrer_policy_origin_when_cross_origin(self) -> Self {
        self.set(header::REFERRER_POLICY, "origin-when-cross-origin")
    }

    pub fn add_referrer_policy_same_origin(self) -> Self {
        self.set(header::REFERRER_POLICY, "same-origin")
    }

    pub fn add_referrer_policy_strict_origin(self) -> Self {
        self.set(header::REFERRER_POLICY, "strict-origin")
    }

    pub fn add_referrer_policy_strict_origin_when_cross_origin(self) -> Self {
        self.set(header::REFERRER_POLICY, "strict-origin-when-cross-origin")
    }

    pub fn add_referrer_policy_unsafe_url(self) -> Self {
        self.set(header::REFERRER_POLICY, "unsafe-url")
    }

    pub fn remove_server_header(mut self) -> Self {
        if !self.policy.remove.contains(&header::SERVER) {
            self.policy.remove.push(header::SERVER);
        }
        self
    }

    pub fn add_custom_header(mut self, name: &str, value: &str) -> Result<Self, PolicyError> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        self.policy.set.insert(name, HeaderValue::from_str(value)?);
        Ok(self)
    }

    pub fn remove_header(mut self, name: &str) -> Result<Self, PolicyError> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        if !self.policy.remove.contains(&name) {
            self.policy.remove.push(name);
        }
        Ok(self)
    }

    pub fn build(self) -> SecurityHeadersPolicy {
        self.policy
    }
}

pub async fn security_headers_middleware(
    State(policy): State<Arc<SecurityHeadersPolicy>>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    policy.apply(response.headers_mut());
    response
}
