//! DataTables request binding.
//!
//! # Responsibilities
//! - Read the flat `columns[i][...]` / `order[i][...]` parameter set from
//!   the urlencoded body and the query string
//! - Apply defaults for absent or malformed values
//! - Reject requests with an invalid draw counter
//!
//! # Design Decisions
//! - Only two conditions fail a bind: a bad `draw` under validation and an
//!   unreadable parameter set. Everything else falls back to a default.
//! - Column parsing stops at the first index without a field
//! - Sort parsing stops at the first missing or out-of-range column index

use std::fmt;
use std::sync::Arc;

use axum::extract::{FromRequest, Query, Request};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::model::{Column, Search, SortDirection};
use super::names;
use super::parse::{self, ValueSource};
use super::result::DataTablesResult;
use crate::config::DataTablesConfig;

/// Callback producing user-defined request parameters.
pub type AdditionalParameters = Arc<dyn Fn(&dyn ValueSource) -> Map<String, Value> + Send + Sync>;

/// Runtime DataTables options, shared through a request extension.
#[derive(Clone)]
pub struct DataTablesOptions {
    pub default_page_length: i32,
    pub draw_validation: bool,
    pub response_additional_parameters: bool,
    pub additional_parameters: Option<AdditionalParameters>,
}

impl DataTablesOptions {
    pub fn with_additional_parameters<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn ValueSource) -> Map<String, Value> + Send + Sync + 'static,
    {
        self.additional_parameters = Some(Arc::new(f));
        self
    }
}

impl Default for DataTablesOptions {
    fn default() -> Self {
        Self::from(&DataTablesConfig::default())
    }
}

impl From<&DataTablesConfig> for DataTablesOptions {
    fn from(config: &DataTablesConfig) -> Self {
        Self {
            default_page_length: config.default_page_length,
            draw_validation: config.draw_validation,
            response_additional_parameters: config.response_additional_parameters,
            additional_parameters: None,
        }
    }
}

impl fmt::Debug for DataTablesOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTablesOptions")
            .field("default_page_length", &self.default_page_length)
            .field("draw_validation", &self.draw_validation)
            .field("response_additional_parameters", &self.response_additional_parameters)
            .field("additional_parameters", &self.additional_parameters.is_some())
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum BindError {
    #[error("draw must be an integer >= 1")]
    InvalidDraw,

    #[error("unreadable DataTables parameters: {0}")]
    Malformed(String),
}

impl IntoResponse for BindError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

/// A bound DataTables grid request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataTablesRequest {
    pub draw: u32,
    pub start: u32,
    /// Page size; -1 asks for every row.
    pub length: i32,
    pub search: Search,
    pub columns: Vec<Column>,
    pub extra: Option<Map<String, Value>>,
    #[serde(skip)]
    emit_extra: bool,
}

impl DataTablesRequest {
    /// Columns carrying a sort, in sort priority order.
    pub fn sorted_columns(&self) -> Vec<&Column> {
        let mut sorted: Vec<&Column> = self.columns.iter().filter(|c| c.sort().is_some()).collect();
        sorted.sort_by_key(|c| c.sort().map(|s| s.order));
        sorted
    }

    /// Build a success result answering this request.
    pub fn respond<T>(&self, records_total: u64, records_filtered: u64, data: T) -> DataTablesResult<T> {
        DataTablesResult::success(self.draw, records_total, records_filtered, data)
            .emit_extra(self.emit_extra)
    }

    /// Build an error result answering this request.
    pub fn respond_error<T>(&self, message: impl Into<String>) -> DataTablesResult<T> {
        DataTablesResult::error(self.draw, message).emit_extra(self.emit_extra)
    }
}

/// Bind a request from raw parameter values.
pub fn bind(values: &dyn ValueSource, options: &DataTablesOptions) -> Result<DataTablesRequest, BindError> {
    // Draw is echoed back to the client; only integers are accepted.
    let draw = parse::int::<u32>(values.value(names::DRAW));
    let draw = if options.draw_validation {
        match draw {
            Some(d) if d >= 1 => d,
            _ => return Err(BindError::InvalidDraw),
        }
    } else {
        draw.unwrap_or(0)
    };

    let start = parse::int::<u32>(values.value(names::START)).unwrap_or(0);
    let length = parse::int::<i32>(values.value(names::LENGTH)).unwrap_or(options.default_page_length);

    let search = Search::new(
        parse::text(values.value(names::SEARCH_VALUE)).map(str::to_string),
        parse::boolean(values.value(names::SEARCH_REGEX)).unwrap_or(false),
    );

    let mut columns = parse_columns(values);
    parse_sorting(values, &mut columns);

    let extra = options.additional_parameters.as_ref().map(|f| f(values));

    Ok(DataTablesRequest {
        draw,
        start,
        length,
        search,
        columns,
        extra,
        emit_extra: options.response_additional_parameters,
    })
}

fn parse_columns(values: &dyn ValueSource) -> Vec<Column> {
    let mut columns = Vec::new();
    for i in 0.. {
        let Some(field) = parse::text(values.value(&names::column_field(i))) else {
            break;
        };

        let name = parse::text(values.value(&names::column_name(i))).unwrap_or_default();
        let sortable = parse::boolean(values.value(&names::column_orderable(i))).unwrap_or(false);
        let searchable = parse::boolean(values.value(&names::column_searchable(i))).unwrap_or(false);
        let search = Search::new(
            parse::text(values.value(&names::column_search_value(i))).map(str::to_string),
            parse::boolean(values.value(&names::column_search_regex(i))).unwrap_or(false),
        );

        columns.push(Column::new(name, field, searchable, sortable, search));
    }
    columns
}

fn parse_sorting(values: &dyn ValueSource, columns: &mut [Column]) {
    for i in 0..columns.len() {
        let Some(index) = parse::int::<usize>(values.value(&names::sort_column(i))) else {
            break;
        };
        let Some(column) = columns.get_mut(index) else {
            break;
        };

        let direction = SortDirection::from_token(values.value(&names::sort_direction(i)));
        if !column.set_sort(i, direction) {
            tracing::debug!(column = %column.field, order = i, "Sort ignored for column");
        }
    }
}

/// GET and HEAD carry their parameters in the query only.
fn has_form_body(req: &Request) -> bool {
    if req.method() == Method::GET || req.method() == Method::HEAD {
        return false;
    }
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
}

impl<S> FromRequest<S> for DataTablesRequest
where
    S: Send + Sync,
{
    type Rejection = BindError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let options = req
            .extensions()
            .get::<DataTablesOptions>()
            .cloned()
            .unwrap_or_default();

        let Query(query) = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
            .map_err(|rejection| BindError::Malformed(rejection.body_text()))?;

        // Form values win over the query string; the query fills the gaps.
        let mut values = if has_form_body(&req) {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|rejection| BindError::Malformed(rejection.body_text()))?;
            pairs
        } else {
            Vec::new()
        };
        values.extend(query);

        bind(&values, &options).inspect_err(|err| {
            tracing::debug!(error = %err, "DataTables request rejected");
        })
    }
}
