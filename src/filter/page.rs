//! Page requests and page results for list endpoints.
//!
//! Page numbers are 1-based. An empty collection has `totalPages = 0` and is
//! both the first and the last page.

use serde::{Deserialize, Serialize};

use super::filter_order::FilterOrder;
use super::types::{SortField, SortOrder};
use crate::config::PaginationConfig;
use crate::validation::Violations;

/// Raw query string parameters. Kept as strings so that malformed numbers
/// surface as violations instead of extractor rejections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<String>,
    pub size: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_number: u32,
    pub page_size: u32,
    pub order: SortOrder,
}

impl PageRequest {
    pub fn new(page_number: u32, page_size: u32, order: SortOrder) -> Self {
        Self {
            page_number,
            page_size,
            order,
        }
    }

    pub fn from_params(
        params: &PageParams,
        config: &PaginationConfig,
        fields: &[SortField],
    ) -> Result<Self, Violations> {
        let mut violations = Violations::new();

        let page_number = match params.page.as_deref().map(str::trim) {
            None | Some("") => Some(1),
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n >= 1 => Some(n),
                _ => {
                    violations.push("page", "Page number must be a whole number greater than or equal to 1");
                    None
                }
            },
        };

        let page_size = match params.size.as_deref().map(str::trim) {
            None | Some("") => Some(config.default_page_size),
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n >= 1 && n <= config.max_page_size => Some(n),
                _ => {
                    violations.push(
                        "size",
                        &format!("Page size must be between 1 and {}", config.max_page_size),
                    );
                    None
                }
            },
        };

        let order = FilterOrder::resolve(params.sort_by.as_deref(), params.sort_dir.as_deref(), fields);

        violations
            .finish(page_number.zip(page_size))
            .map(|(page_number, page_size)| Self::new(page_number, page_size, order))
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page_number - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total_elements: u64,
    pub page_number: u32,
    pub total_pages: u64,
    pub is_first: bool,
    pub is_last: bool,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total_elements: u64, request: &PageRequest) -> Self {
        let page_size = u64::from(request.page_size.max(1));
        let total_pages = total_elements.div_ceil(page_size);
        let page_number = request.page_number;
        let current = u64::from(page_number);

        Self {
            data,
            total_elements,
            page_number,
            total_pages,
            is_first: page_number == 1,
            is_last: current >= total_pages,
            has_next: current < total_pages,
            has_previous: page_number > 1,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            page_number: self.page_number,
            total_pages: self.total_pages,
            is_first: self.is_first,
            is_last: self.is_last,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}
