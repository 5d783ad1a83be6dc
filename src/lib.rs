//! DataTables grid adapter and HTTP middleware kit for axum services.
//!
//! # Architecture Overview
//!
//! ```text
//!   client ──▶ trace ─▶ timeout ─▶ correlation ─▶ client ip ─▶ security headers
//!                                                                   │
//!              ┌────────────────────────────────────────────────────┘
//!              ▼
//!          version ─▶ error handler ─▶ token blacklist ─▶ read only ─▶ routes
//!                          │                  │                          │
//!                          │                  ▼                          ▼
//!                          │           DistributedCache          DataTablesRequest
//!                          │          (memory | redis)           → handler
//!                          │                                     → DataTablesResult
//!                          └── renders AppError / panics as JSON or HTML
//! ```

pub mod cache;
pub mod config;
pub mod datatables;
pub mod error;
pub mod http;
pub mod observability;

pub use config::AppConfig;
pub use error::AppError;
pub use http::HttpServer;
