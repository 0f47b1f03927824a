//! Pagination types shared by list queries.

use serde::{Deserialize, Serialize};

/// Page/size/search/sort parameters accepted by every list query.
///
/// The field set deliberately matches the shape list cache keys are built
/// from, so two requests with equal `PageParams` share a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    /// 1-based page number.
    pub page: u32,
    /// Items per page, clamped to [`Self::MAX_PAGE_SIZE`].
    pub page_size: u32,
    /// Optional case-insensitive search term.
    pub search: Option<String>,
    /// Column to sort by; each query validates against its own whitelist.
    pub sort_by: Option<String>,
    /// Ascending sort when true.
    pub sort_asc: bool,
}

impl PageParams {
    /// Default number of items per page.
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    /// Upper bound on items per page.
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Normalize raw values: 1-based page, clamped size, trimmed search.
    #[must_use]
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(Self::DEFAULT_PAGE_SIZE)
                .clamp(1, Self::MAX_PAGE_SIZE),
            search: None,
            sort_by: None,
            sort_asc: true,
        }
    }

    /// Row offset for SQL `OFFSET`.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    /// Row limit for SQL `LIMIT`.
    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: i64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Assemble a page from one query's rows and the matching count.
    #[must_use]
    pub fn new(items: Vec<T>, params: &PageParams, total_count: i64) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let total_pages = if total_count <= 0 {
            0
        } else {
            // total_count > 0 and page_size >= 1 here, so this matches i64::div_ceil
            // (unstable on stable toolchains) exactly for the positive-operand case.
            ((total_count + i64::from(params.page_size) - 1) / i64::from(params.page_size)) as u32
        };

        Self {
            items,
            page: params.page,
            page_size: params.page_size,
            total_count,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_normalization() {
        let params = PageParams::new(Some(0), Some(1000));
        assert_eq!(params.page, 1);
        assert_eq!(params.page_size, PageParams::MAX_PAGE_SIZE);

        let params = PageParams::new(None, None);
        assert_eq!(params.page, 1);
        assert_eq!(params.page_size, PageParams::DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_offset_and_limit() {
        let params = PageParams::new(Some(3), Some(25));
        assert_eq!(params.offset(), 50);
        assert_eq!(params.limit(), 25);
    }

    #[test]
    fn test_total_pages() {
        let params = PageParams::new(Some(1), Some(20));
        let page = Page::new(vec![1, 2, 3], &params, 41);
        assert_eq!(page.total_pages, 3);

        let empty: Page<i32> = Page::new(vec![], &params, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
