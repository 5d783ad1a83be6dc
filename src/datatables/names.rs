//! Wire names used by the DataTables client.

pub const DRAW: &str = "draw";
pub const START: &str = "start";
pub const LENGTH: &str = "length";
pub const SEARCH_VALUE: &str = "search[value]";
pub const SEARCH_REGEX: &str = "search[regex]";

pub const SORT_ASCENDING: &str = "asc";
pub const SORT_DESCENDING: &str = "desc";

pub fn sort_column(i: usize) -> String {
    format!("order[{i}][column]")
}

pub fn sort_direction(i: usize) -> String {
    format!("order[{i}][dir]")
}

pub fn column_field(i: usize) -> String {
    format!("columns[{i}][data]")
}

pub fn column_name(i: usize) -> String {
    format!("columns[{i}][name]")
}

pub fn column_searchable(i: usize) -> String {
    format!("columns[{i}][searchable]")
}

pub fn column_orderable(i: usize) -> String {
    format!("columns[{i}][orderable]")
}

pub fn column_search_value(i: usize) -> String {
    format!("columns[{i}][search][value]")
}

pub fn column_search_regex(i: usize) -> String {
    format!("columns[{i}][search][regex]")
}

/// Response field names.
pub mod response {
    pub const DRAW: &str = "draw";
    pub const RECORDS_TOTAL: &str = "recordsTotal";
    pub const RECORDS_FILTERED: &str = "recordsFiltered";
    pub const DATA: &str = "data";
    pub const ERROR: &str = "error";
}
