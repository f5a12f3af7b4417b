use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Lenient parse: anything other than `desc` (any case) is ascending.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    pub fn to_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A sortable attribute: JSON field name and the column backing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortField {
    pub field: &'static str,
    pub column: &'static str,
}

impl SortField {
    pub const ID: SortField = SortField { field: "id", column: "id" };

    pub const fn new(field: &'static str, column: &'static str) -> Self {
        Self { field, column }
    }
}

/// Resolved ordering for a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            field: SortField::ID,
            direction: SortDirection::Asc,
        }
    }
}
