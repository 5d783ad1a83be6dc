//! Paging and sorting from plain query strings.
//!
//! `?page=2&pageSize=50&sort=name-desc` for endpoints that are not DataTables
//! grids. Missing or unparsable values fall back to defaults.

use std::str::FromStr;

use axum::{
    extract::{rejection::QueryRejection, FromRequestParts, Query},
    http::request::Parts,
};

use crate::datatables::{parse, SortDirection, ValueSource};

pub const DEFAULT_PAGE: i32 = 1;
pub const DEFAULT_PAGE_SIZE: i32 = 100;

/// Raw query pairs with lenient typed accessors.
#[derive(Debug, Clone, Default)]
pub struct QueryValues(pub Vec<(String, String)>);

impl ValueSource for QueryValues {
    fn value(&self, key: &str) -> Option<&str> {
        self.0.value(key)
    }
}

impl QueryValues {
    pub fn int(&self, key: &str) -> Option<i32> {
        parse::int(self.value(key))
    }

    pub fn decimal(&self, key: &str) -> Option<f64> {
        parse::parsed(self.value(key))
    }

    /// Every value for `key`, comma-split; unparsable entries stay `None`.
    pub fn decimals(&self, key: &str) -> Vec<Option<f64>> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .flat_map(|(_, v)| v.split(','))
            .map(|item| parse::parsed(Some(item)))
            .collect()
    }

    /// Parsed through `T`'s `FromStr`; case rules are up to `T`.
    pub fn enum_value<T: FromStr>(&self, key: &str) -> Option<T> {
        parse::parsed(self.value(key))
    }

    /// `true`/`false` (any case) or `1`/`0`.
    pub fn flag(&self, key: &str) -> Option<bool> {
        let raw = self.value(key);
        parse::boolean(raw).or_else(|| match raw.map(str::trim) {
            Some("1") => Some(true),
            Some("0") => Some(false),
            _ => None,
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for QueryValues {
    type Rejection = QueryRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)?;
        Ok(Self(pairs))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    /// `name`, `name-desc` or `name desc`. Anything but `desc` sorts ascending.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut segments = raw.split(['-', ' ']);
        let field = segments.next().filter(|f| !f.is_empty())?;
        let direction = match segments.next() {
            Some(token) if token.eq_ignore_ascii_case("desc") => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };

        Some(Self {
            field: field.to_string(),
            direction,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page: i32,
    pub page_size: i32,
    pub sort: Option<SortSpec>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            sort: None,
        }
    }
}

impl PageQuery {
    pub fn from_values(values: &QueryValues) -> Self {
        Self {
            page: values.int("page").unwrap_or(DEFAULT_PAGE),
            page_size: values.int("pageSize").unwrap_or(DEFAULT_PAGE_SIZE),
            sort: values.value("sort").and_then(SortSpec::parse),
        }
    }

    /// Rows to skip for the requested page.
    pub fn offset(&self) -> usize {
        let skipped = i64::from(self.page.max(1) - 1) * i64::from(self.page_size.max(0));
        usize::try_from(skipped).unwrap_or(0)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for PageQuery {
    type Rejection = QueryRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let values = QueryValues::from_request_parts(parts, state).await?;
        Ok(Self::from_values(&values))
    }
}
