//! Request pipeline middleware.
//!
//! # Data Flow
//! ```text
//! request
//!     → correlation.rs (trace identifier, request span)
//!     → security_headers.rs (applied on the way out)
//!     → error_handler.rs (catches everything below)
//!     → token_blacklist.rs (revoked bearer tokens → 403)
//!     → read_only.rs (writes → 503)
//!     → handler, optionally wrapped by etag.rs
//! ```
//!
//! `version.rs` is a plain `SetResponseHeaderLayer`.

pub mod correlation;
pub mod error_handler;
pub mod etag;
pub mod read_only;
pub mod security_headers;
pub mod token_blacklist;
pub mod version;

pub use correlation::{correlation_id_middleware, CorrelationId, CorrelationIdExt, CorrelationState};
pub use error_handler::{
    error_handler_middleware, CodeMap, ErrorHandlerState, ErrorResponse, StatusCodeProblemDetails,
    ValidationErrorResponse,
};
pub use etag::{compute_etag, etag_middleware, EtagOptions};
pub use read_only::{read_only_middleware, READ_ONLY_MESSAGE};
pub use security_headers::{security_headers_middleware, SecurityHeadersBuilder, SecurityHeadersPolicy};
pub use token_blacklist::{revoke_token, token_blacklist_middleware, TokenBlacklistState};
pub use version::ApiVersion;
