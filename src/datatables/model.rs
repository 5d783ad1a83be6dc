//! DataTables value objects.

use serde::Serialize;

use super::names;

/// Search term for the whole grid or a single column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Search {
    /// `None` when the client sent nothing or only whitespace.
    pub value: Option<String>,
    pub is_regex: bool,
}

impl Search {
    pub fn new(value: Option<String>, is_regex: bool) -> Self {
        Self { value, is_regex }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Only an explicit `desc` (any case) sorts descending.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some(t) if t.eq_ignore_ascii_case(names::SORT_DESCENDING) => SortDirection::Descending,
            _ => SortDirection::Ascending,
        }
    }

    pub fn as_token(&self) -> &'static str {
        match self {
            SortDirection::Ascending => names::SORT_ASCENDING,
            SortDirection::Descending => names::SORT_DESCENDING,
        }
    }
}

/// Sort applied to one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sort {
    /// Priority in a multi-column sort; 0 sorts first.
    pub order: usize,
    pub direction: SortDirection,
}

/// A grid column as described by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    /// Data field the column renders.
    pub field: String,
    pub searchable: bool,
    pub sortable: bool,
    pub search: Search,
    sort: Option<Sort>,
}

impl Column {
    pub fn new(
        name: impl Into<String>,
        field: impl Into<String>,
        searchable: bool,
        sortable: bool,
        search: Search,
    ) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            searchable,
            sortable,
            search,
            sort: None,
        }
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    /// Attach a sort. Refused for non-orderable columns and for columns that
    /// already carry one.
    pub(crate) fn set_sort(&mut self, order: usize, direction: SortDirection) -> bool {
        if !self.sortable || self.sort.is_some() {
            return false;
        }
        self.sort = Some(Sort { order, direction });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_tokens() {
        for token in ["DESC", "desc", "Desc"] {
            assert_eq!(SortDirection::from_token(Some(token)), SortDirection::Descending);
        }
        for token in ["asc", "ASC", "", "descending", " desc"] {
            assert_eq!(SortDirection::from_token(Some(token)), SortDirection::Ascending);
        }
        assert_eq!(SortDirection::from_token(None), SortDirection::Ascending);
    }

    #[test]
    fn test_set_sort_at_most_once() {
        let mut column = Column::new("Name", "name", true, true, Search::default());
        assert!(column.set_sort(0, SortDirection::Descending));
        assert!(!column.set_sort(1, SortDirection::Ascending));

        let sort = column.sort().unwrap();
        assert_eq!(sort.order, 0);
        assert_eq!(sort.direction, SortDirection::Descending);
    }

    #[test]
    fn test_set_sort_refused_when_not_orderable() {
        let mut column = Column::new("Id", "id", false, false, Search::default());
        assert!(!column.set_sort(0, SortDirection::Ascending));
        assert!(column.sort().is_none());
    }
}
