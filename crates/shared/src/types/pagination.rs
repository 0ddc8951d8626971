//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// A pagination request with 1-indexed page number.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageRequest {
    /// Returns the row offset for this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    /// Returns the row limit for this page.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }

    /// Returns a copy with `per_page` clamped to `max`.
    #[must_use]
    pub fn clamped(self, max: u32) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, max),
        }
    }
}

/// Pagination metadata returned alongside page data.
#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    /// Current page number (1-indexed).
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items across all pages.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u32,
    /// True if pages remain after this one.
    pub has_more: bool,
}

/// A paginated response.
#[derive(Debug, Clone, Serialize)]
pub struct PageResponse<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

impl<T> PageResponse<T> {
    /// Creates a new paginated response.
    #[must_use]
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        let total_pages = if total == 0 {
            1
        } else {
            u32::try_from(total.div_ceil(u64::from(per_page.max(1)))).unwrap_or(u32::MAX)
        };
        let has_more = u64::from(page) * u64::from(per_page) < total;

        Self {
            data,
            meta: PageMeta {
                page,
                per_page,
                total,
                total_pages,
                has_more,
            },
        }
    }
}
