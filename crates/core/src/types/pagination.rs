//! Offset pagination for catalog listings.

use serde::Serialize;

/// A validated, 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Build a page request. A missing or zero page means page 1, and a zero
    /// page size is treated as 1.
    #[must_use]
    pub fn new(page: Option<u32>, page_size: u32) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(1),
            page_size: page_size.max(1),
        }
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Rows to skip (`OFFSET`).
    #[must_use]
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.page_size)
    }

    /// Rows to fetch (`LIMIT`).
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

/// Navigation metadata rendered under a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub next_page: u32,
    pub previous_page: u32,
    pub last_page: u32,
    pub total_items: u64,
}

impl Pagination {
    #[must_use]
    pub fn new(request: PageRequest, total_items: u64) -> Self {
        let page = request.page();
        let page_size = u64::from(request.page_size());
        let last_page = total_items.div_ceil(page_size);

        Self {
            current_page: page,
            has_next_page: page_size * u64::from(page) < total_items,
            has_previous_page: page > 1,
            next_page: page.saturating_add(1),
            previous_page: page.saturating_sub(1),
            last_page: u32::try_from(last_page).unwrap_or(u32::MAX),
            total_items,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}
