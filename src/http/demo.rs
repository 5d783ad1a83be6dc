//! Sample routes backed by an in-memory table.
//!
//! Served by the binary so the pipeline can be exercised end to end: a
//! DataTables grid, a plain paged listing and a route that fails with a
//! domain error.

use std::cmp::Ordering;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::datatables::{DataTablesRequest, DataTablesResult, SortDirection};
use crate::error::AppError;
use crate::http::middleware::StatusCodeProblemDetails;
use crate::http::query::PageQuery;

/// Error code raised by `/demo/fail`.
pub const DEMO_NOT_FOUND: i32 = 4040;

#[derive(Debug, Clone, Serialize)]
pub struct Server {
    pub id: u32,
    pub name: String,
    pub region: String,
    pub status: String,
}

impl Server {
    fn field(&self, field: &str) -> Option<String> {
        match field {
            "id" => Some(self.id.to_string()),
            "name" => Some(self.name.clone()),
            "region" => Some(self.region.clone()),
            "status" => Some(self.status.clone()),
            _ => None,
        }
    }

    fn compare(&self, other: &Self, field: &str) -> Ordering {
        match field {
            "id" => self.id.cmp(&other.id),
            _ => self.field(field).cmp(&other.field(field)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemoTable {
    rows: Arc<Vec<Server>>,
}

impl DemoTable {
    pub fn new(rows: Vec<Server>) -> Self {
        Self { rows: Arc::new(rows) }
    }

    pub fn seeded() -> Self {
        let regions = ["eu-west", "us-east", "ap-south"];
        let statuses = ["running", "stopped", "draining"];
        let rows = (1..=30)
            .map(|id| Server {
                id,
                name: format!("node-{id:02}"),
                region: regions[id as usize % regions.len()].to_string(),
                status: statuses[id as usize % statuses.len()].to_string(),
            })
            .collect();
        Self::new(rows)
    }

    /// Filter, sort and page `rows` as the grid asked.
    pub fn query(&self, request: &DataTablesRequest) -> DataTablesResult<Vec<Server>> {
        let needle = request.search.value.as_deref().map(str::to_lowercase);
        let searchable: Vec<&str> = request
            .columns
            .iter()
            .filter(|c| c.searchable)
            .map(|c| c.field.as_str())
            .collect();

        let mut matched: Vec<&Server> = self
            .rows
            .iter()
            .filter(|row| match &needle {
                Some(needle) => searchable.iter().any(|field| {
                    row.field(field)
                        .is_some_and(|v| v.to_lowercase().contains(needle.as_str()))
                }),
                None => true,
            })
            .collect();

        let sorted = request.sorted_columns();
        matched.sort_by(|a, b| {
            sorted
                .iter()
                .filter_map(|c| c.sort().map(|s| (c.field.as_str(), s.direction)))
                .map(|(field, direction)| match direction {
                    SortDirection::Ascending => a.compare(b, field),
                    SortDirection::Descending => b.compare(a, field),
                })
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        let filtered = matched.len() as u64;
        let take = usize::try_from(request.length).unwrap_or(usize::MAX);
        let page = matched
            .into_iter()
            .skip(request.start as usize)
            .take(take)
            .cloned()
            .collect();

        request.respond(self.rows.len() as u64, filtered, page)
    }
}

async fn grid(State(table): State<DemoTable>, request: DataTablesRequest) -> DataTablesResult<Vec<Server>> {
    table.query(&request)
}

async fn list(State(table): State<DemoTable>, page: PageQuery) -> Json<Value> {
    let mut rows: Vec<&Server> = table.rows.iter().collect();
    if let Some(sort) = &page.sort {
        rows.sort_by(|a, b| match sort.direction {
            SortDirection::Ascending => a.compare(b, &sort.field),
            SortDirection::Descending => b.compare(a, &sort.field),
        });
    }

    let items: Vec<&Server> = rows
        .into_iter()
        .skip(page.offset())
        .take(usize::try_from(page.page_size).unwrap_or(0))
        .collect();

    Json(json!({
        "page": page.page,
        "pageSize": page.page_size,
        "total": table.rows.len(),
        "items": items,
    }))
}

async fn server(State(table): State<DemoTable>, Path(id): Path<u32>) -> Response {
    match table.rows.iter().find(|row| row.id == id) {
        Some(row) => Json(row.clone()).into_response(),
        None => StatusCodeProblemDetails::new(StatusCode::NOT_FOUND)
            .detail(format!("No server with id {id}."))
            .into_response(),
    }
}

async fn fail() -> Result<Json<Value>, AppError> {
    Err(AppError::domain(DEMO_NOT_FOUND, "Server not found"))
}

/// `/demo/grid` (GET or POST), `/demo/servers`, `/demo/servers/{id}`, `/demo/fail`.
pub fn demo_routes(table: DemoTable) -> Router {
    Router::new()
        .route("/demo/grid", get(grid).post(grid))
        .route("/demo/servers", get(list))
        .route("/demo/servers/{id}", get(server))
        .route("/demo/fail", get(fail))
        .with_state(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatables::{bind, DataTablesOptions};
    use std::collections::HashMap;

    fn grid_request(pairs: &[(&str, &str)]) -> DataTablesRequest {
        let mut values: HashMap<String, String> = HashMap::new();
        for (i, field) in ["id", "name", "region", "status"].iter().enumerate() {
            values.insert(format!("columns[{i}][data]"), field.to_string());
            values.insert(format!("columns[{i}][searchable]"), "true".into());
            values.insert(format!("columns[{i}][orderable]"), "true".into());
        }
        for (k, v) in pairs {
            values.insert(k.to_string(), v.to_string());
        }
        bind(&values, &DataTablesOptions::default()).unwrap()
    }

    fn ids(result: &DataTablesResult<Vec<Server>>) -> Vec<u32> {
        let json = serde_json::to_value(result).unwrap();
        json["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["id"].as_u64().unwrap() as u32)
            .collect()
    }

    #[test]
    fn test_paging() {
        let table = DemoTable::seeded();
        let result = table.query(&grid_request(&[("draw", "1"), ("start", "5"), ("length", "3")]));
        assert_eq!(ids(&result), vec![6, 7, 8]);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["recordsTotal"], 30);
        assert_eq!(json["recordsFiltered"], 30);
    }

    #[test]
    fn test_length_minus_one_returns_all() {
        let table = DemoTable::seeded();
        let result = table.query(&grid_request(&[("draw", "1"), ("length", "-1")]));
        assert_eq!(ids(&result).len(), 30);
    }

    #[test]
    fn test_search_and_sort() {
        let table = DemoTable::seeded();
        let result = table.query(&grid_request(&[
            ("draw", "2"),
            ("search[value]", "NODE-1"),
            ("order[0][column]", "0"),
            ("order[0][dir]", "desc"),
            ("length", "100"),
        ]));

        assert_eq!(ids(&result), vec![19, 18, 17, 16, 15, 14, 13, 12, 11, 10]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["recordsFiltered"], 10);
        assert_eq!(json["draw"], 2);
    }
}
