//! DataTables response formatting.
//!
//! # Wire shapes
//! ```text
//! success: { "draw", "recordsTotal", "recordsFiltered", "data", ...extra }
//! error:   { "draw", "error", ...extra }
//! ```
//!
//! A result is a success only when it carries data and no (non-blank) error
//! message. The payload is serialized straight into the response buffer.

use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use super::names::response as names;
use crate::error::AppError;

const RESERVED: [&str; 5] = [
    names::DRAW,
    names::RECORDS_TOTAL,
    names::RECORDS_FILTERED,
    names::DATA,
    names::ERROR,
];

#[derive(Debug, Clone, PartialEq)]
pub struct DataTablesResult<T = Value> {
    draw: u32,
    records_total: u64,
    records_filtered: u64,
    data: Option<T>,
    error: Option<String>,
    extra: Option<Map<String, Value>>,
    emit_extra: bool,
}

impl<T> DataTablesResult<T> {
    /// General constructor; prefer [`success`](Self::success) or [`error`](Self::error).
    pub fn new(
        draw: u32,
        records_total: u64,
        records_filtered: u64,
        data: Option<T>,
        error: Option<String>,
    ) -> Self {
        Self {
            draw,
            records_total,
            records_filtered,
            data,
            error,
            extra: None,
            emit_extra: true,
        }
    }

    pub fn success(draw: u32, records_total: u64, records_filtered: u64, data: T) -> Self {
        Self::new(draw, records_total, records_filtered, Some(data), None)
    }

    pub fn error(draw: u32, message: impl Into<String>) -> Self {
        Self::new(draw, 0, 0, None, Some(message.into()))
    }

    /// Extra top-level fields written after the fixed ones.
    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = Some(extra);
        self
    }

    pub(crate) fn emit_extra(mut self, emit: bool) -> Self {
        self.emit_extra = emit;
        self
    }

    pub fn draw(&self) -> u32 {
        self.draw
    }

    pub fn is_success(&self) -> bool {
        self.data.is_some() && self.error.as_deref().map_or(true, |e| e.trim().is_empty())
    }
}

impl<T: Serialize> Serialize for DataTablesResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(names::DRAW, &self.draw)?;

        match &self.data {
            Some(data) if self.is_success() => {
                map.serialize_entry(names::RECORDS_TOTAL, &self.records_total)?;
                map.serialize_entry(names::RECORDS_FILTERED, &self.records_filtered)?;
                map.serialize_entry(names::DATA, data)?;
            }
            _ => map.serialize_entry(names::ERROR, &self.error)?,
        }

        if self.emit_extra {
            for (key, value) in self.extra.iter().flatten() {
                if RESERVED.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Skipping extra field that shadows a DataTables field");
                    continue;
                }
                map.serialize_entry(key, value)?;
            }
        }

        map.end()
    }
}

impl<T: Serialize> IntoResponse for DataTablesResult<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self) {
            Ok(body) => (
                [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                body,
            )
                .into_response(),
            Err(err) => {
                AppError::internal(format!("failed to serialize DataTables result: {err}")).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    fn render<T: Serialize>(result: &DataTablesResult<T>) -> String {
        serde_json::to_string(result).unwrap()
    }

    #[test]
    fn test_success_shape_and_order() {
        let result = DataTablesResult::success(4, 100, 12, json!([{ "id": 1 }]));
        assert_eq!(
            render(&result),
            r#"{"draw":4,"recordsTotal":100,"recordsFiltered":12,"data":[{"id":1}]}"#
        );
    }

    #[test]
    fn test_error_shape() {
        let result: DataTablesResult = DataTablesResult::error(2, "backend down");
        assert_eq!(render(&result), r#"{"draw":2,"error":"backend down"}"#);
    }

    #[test]
    fn test_classification() {
        let error_only: DataTablesResult = DataTablesResult::new(1, 0, 0, None, Some("x".into()));
        assert!(!error_only.is_success());

        let data_only = DataTablesResult::new(1, 5, 5, Some(json!({ "a": 1 })), None);
        assert!(data_only.is_success());

        let blank_error = DataTablesResult::new(1, 5, 5, Some(json!([])), Some("  ".into()));
        assert!(blank_error.is_success());

        let both = DataTablesResult::new(1, 5, 5, Some(json!([])), Some("broken".into()));
        assert!(!both.is_success());
        assert_eq!(render(&both), r#"{"draw":1,"error":"broken"}"#);

        let neither: DataTablesResult = DataTablesResult::new(7, 0, 0, None, None);
        assert_eq!(render(&neither), r#"{"draw":7,"error":null}"#);
    }

    #[test]
    fn test_extra_fields_follow_fixed_fields() {
        let mut extra = Map::new();
        extra.insert("elapsedMs".into(), json!(12));
        extra.insert("summary".into(), json!({ "total": 3.5 }));
        extra.insert("draw".into(), json!(99));

        let result = DataTablesResult::success(1, 1, 1, vec!["row"]).with_extra(extra);
        assert_eq!(
            render(&result),
            r#"{"draw":1,"recordsTotal":1,"recordsFiltered":1,"data":["row"],"elapsedMs":12,"summary":{"total":3.5}}"#
        );
    }

    #[test]
    fn test_extra_suppressed_when_disabled() {
        let mut extra = Map::new();
        extra.insert("hint".into(), json!("x"));

        let result: DataTablesResult = DataTablesResult::error(1, "nope")
            .with_extra(extra)
            .emit_extra(false);
        assert_eq!(render(&result), r#"{"draw":1,"error":"nope"}"#);
    }

    #[tokio::test]
    async fn test_into_response() {
        let response = DataTablesResult::success(1, 0, 0, Vec::<u8>::new()).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            HeaderValue::from_static("application/json")
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            &body[..],
            br#"{"draw":1,"recordsTotal":0,"recordsFiltered":0,"data":[]}"#
        );
    }
}
