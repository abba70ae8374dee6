//! Common functionality for paging list endpoints.

use serde::Deserialize;

/// The config that controls how list endpoints page their data.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The number of rows per page when the request does not specify one.
    pub default_page_size: u64,
    /// The largest page size a request may ask for.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 500,
        }
    }
}

/// The pagination query parameters accepted by list endpoints.
///
/// Pages are one-indexed. Out-of-range values are clamped rather than
/// rejected.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    /// The one-indexed page to return.
    pub page: Option<u64>,
    /// The number of rows per page.
    pub page_size: Option<u64>,
}

impl PageQuery {
    /// Resolve the query against `config` into a SQL `LIMIT` and `OFFSET`.
    pub fn to_limit_offset(self, config: &PaginationConfig) -> (u64, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(config.default_page_size)
            .clamp(1, config.max_page_size);

        (page_size, (page - 1) * page_size)
    }
}
