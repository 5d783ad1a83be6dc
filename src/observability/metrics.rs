//! Metrics collection and exposition.
//!
//! # Metrics
//! - `middleware_etag_responses_total` (counter): ETag filter outcome by `outcome`
//!   (hashed, not_modified, skipped_size, skipped_status, skipped_existing)
//! - `middleware_blacklist_rejections_total` (counter): revoked bearer tokens
//! - `middleware_read_only_rejections_total` (counter): writes refused in read only mode
//! - `middleware_unhandled_errors_total` (counter): error handler hits by `kind`
//!   (error, panic)

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_etag(outcome: &'static str) {
    ::metrics::counter!("middleware_etag_responses_total", "outcome" => outcome).increment(1);
}

pub fn record_blacklist_rejection() {
    ::metrics::counter!("middleware_blacklist_rejections_total").increment(1);
}

pub fn record_read_only_rejection() {
    ::metrics::counter!("middleware_read_only_rejections_total").increment(1);
}

pub fn record_unhandled_error(kind: &'static str) {
    ::metrics::counter!("middleware_unhandled_errors_total", "kind" => kind).increment(1);
}
