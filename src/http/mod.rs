//! HTTP surface: server assembly, middleware and extractors.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (router, layer stack, graceful shutdown)
//!     → middleware/ (correlation, errors, headers, gates)
//!     → forwarded.rs (client address)
//!     → application routes (DataTables, paged queries)
//!     → health.rs
//! ```

pub mod demo;
pub mod forwarded;
pub mod health;
pub mod middleware;
pub mod query;
pub mod server;

pub use forwarded::ClientIp;
pub use query::{PageQuery, QueryValues, SortSpec};
pub use server::{HttpServer, ServerError};
