//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

use crate::config::pagination::PaginationConfig;

/// A normalized page request. Always has `page >= 1` and a page size
/// within the configured bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-based).
    pub page: i64,
    /// Number of rows per page.
    pub page_size: i64,
}

impl PageRequest {
    /// Normalize a raw page/page-size pair.
    ///
    /// A page below 1 becomes 1. A page size below 1 or above the
    /// configured maximum is replaced by the default page size; it is
    /// never clamped to the maximum.
    pub fn normalize(page: i64, page_size: i64, bounds: &PaginationConfig) -> Self {
        let page = if page < 1 { 1 } else { page };
        let page_size = if page_size < 1 || page_size > bounds.max_page_size {
            bounds.default_page_size
        } else {
            page_size
        };
        Self { page, page_size }
    }

    /// Normalize optional query-string values, treating absence as zero.
    pub fn from_query(page: Option<i64>, page_size: Option<i64>, bounds: &PaginationConfig) -> Self {
        Self::normalize(page.unwrap_or(0), page_size.unwrap_or(0), bounds)
    }

    /// SQL `OFFSET` value.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// SQL `LIMIT` value.
    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

/// Number of pages needed to show `total` rows, zero when either side is
/// zero or negative.
pub fn calc_total_pages(total: i64, page_size: i64) -> i64 {
    if page_size <= 0 || total <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

/// One page of results together with the count for the whole result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Rows on this page.
    pub items: Vec<T>,
    /// Total number of matching rows across all pages.
    pub total: i64,
    /// Current page number (1-based).
    pub page: i64,
    /// Number of rows per page.
    pub page_size: i64,
    /// Total number of pages.
    pub total_pages: i64,
}

impl<T> Page<T> {
    /// Assemble a page from its rows and the full-set count.
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
            total_pages: calc_total_pages(total, request.page_size),
        }
    }

    /// Convert the rows while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}
