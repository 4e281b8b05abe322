//! Page/limit pagination utilities.

use serde::{Deserialize, Serialize};

/// First page number. Pages are 1-based.
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size when the client sends none.
pub const DEFAULT_LIMIT: u32 = 10;
/// Upper bound on page size; larger requests are clamped.
pub const MAX_LIMIT: u32 = 100;

/// Raw pagination query parameters as sent by clients.
///
/// Both fields are optional; [`Page::from_params`] applies defaults
/// and clamping.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Normalized pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub number: u32,
    /// Records per page, within `1..=MAX_LIMIT`.
    pub limit: u32,
}

impl Page {
    /// Normalizes raw query parameters into a valid window.
    ///
    /// Zero or missing values fall back to defaults; limits above
    /// [`MAX_LIMIT`] are clamped down.
    pub fn from_params(params: PageParams) -> Self {
        let number = match params.page {
            Some(0) | None => DEFAULT_PAGE,
            Some(n) => n,
        };
        let limit = match params.limit {
            Some(0) | None => DEFAULT_LIMIT,
            Some(n) => n.min(MAX_LIMIT),
        };
        Self { number, limit }
    }

    /// Number of records to skip for this window.
    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Pagination metadata returned alongside paged collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total_records: i64,
    pub total_pages: i64,
}

impl PageMeta {
    /// Builds metadata for a window over `total_records` records.
    pub fn new(page: Page, total_records: i64) -> Self {
        let limit = i64::from(page.limit);
        let total_pages = if total_records == 0 {
            0
        } else {
            (total_records + limit - 1) / limit
        };
        Self {
            page: page.number,
            limit: page.limit,
            total_records,
            total_pages,
        }
    }
}
