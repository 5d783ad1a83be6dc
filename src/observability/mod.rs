//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! middleware and handlers produce:
//!     → logging.rs (structured log events, correlation ID span)
//!     → metrics.rs (counters for middleware decisions)
//!
//! consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - The correlation ID span opened per request is the only request context
//! - Metrics are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
