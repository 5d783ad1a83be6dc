//! DataTables grid protocol adapter.
//!
//! # Data Flow
//! ```text
//! query string / urlencoded form
//!     → parse.rs (lenient per-type parsing)
//!     → request.rs (bind draw, paging, search, columns, sorting)
//!     → handler (business logic)
//!     → result.rs (flat JSON, success or error shape)
//! ```

pub mod model;
pub mod names;
pub mod parse;
pub mod request;
pub mod result;

pub use model::{Column, Search, Sort, SortDirection};
pub use parse::ValueSource;
pub use request::{bind, AdditionalParameters, BindError, DataTablesOptions, DataTablesRequest};
pub use result::DataTablesResult;
