//! Pagination types
//!
//! Page bookkeeping and the request filters shared by the paged fetcher.

use crate::error::{Error, Result};
use crate::types::{JsonValue, Record};
use chrono::NaiveDate;
use std::time::Duration;

/// Records requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Pause between page requests
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(1100);

/// Query filters applied to every page of a fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchFilters {
    /// `graduation_year=<year>`
    pub grad_year: Option<u16>,
    /// `updated_after=<YYYY-MM-DD>`
    pub updated_after: Option<NaiveDate>,
}

impl FetchFilters {
    /// No filters
    pub fn none() -> Self {
        Self::default()
    }

    /// Filter by graduation year
    #[must_use]
    pub fn grad_year(mut self, year: u16) -> Self {
        self.grad_year = Some(year);
        self
    }

    /// Filter by last update date
    #[must_use]
    pub fn updated_after(mut self, date: NaiveDate) -> Self {
        self.updated_after = Some(date);
        self
    }

    /// Render the filter query parameters followed by the page size limit
    pub fn query_string(&self, page_size: u32) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(year) = self.grad_year {
            parts.push(format!("graduation_year={year}"));
        }
        if let Some(date) = self.updated_after {
            parts.push(format!("updated_after={}", date.format("%Y-%m-%d")));
        }
        parts.push(format!("limit={page_size}"));
        parts.join("&")
    }
}

/// Page size and pacing for a paged fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageConfig {
    /// `limit` sent with every request
    pub page_size: u32,
    /// Minimum gap between consecutive page requests on one client
    pub page_delay: Duration,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }
}

impl PageConfig {
    /// Set the page delay
    #[must_use]
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }
}

/// Progress of one paged fetch session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    /// Next page to request (1-based)
    pub current_page: u32,
    /// Records received so far
    pub record_count: u64,
    /// Server-reported record total, once known
    pub total_count: Option<u64>,
    /// Server-reported page total, once known
    pub total_pages: Option<u32>,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new()
    }
}

impl PageState {
    /// Fresh state positioned at page 1
    pub fn new() -> Self {
        Self {
            current_page: 1,
            record_count: 0,
            total_count: None,
            total_pages: None,
        }
    }

    /// Complete once the page total is known and passed
    pub fn is_complete(&self) -> bool {
        self.total_pages
            .is_some_and(|total| self.current_page > total)
    }

    /// Whether totals have been captured
    pub fn totals_known(&self) -> bool {
        self.total_pages.is_some()
    }

    /// Capture totals. Ignored once they are known.
    pub fn set_totals(&mut self, total_count: u64, total_pages: u32) {
        if self.totals_known() {
            return;
        }
        self.total_count = Some(total_count);
        self.total_pages = Some(total_pages);
    }

    /// Add a page's records to the running count
    pub fn add_records(&mut self, count: usize) {
        self.record_count += count as u64;
    }

    /// Move to the next page
    pub fn advance(&mut self) {
        self.current_page += 1;
    }
}

/// One decoded page response
#[derive(Debug, Clone)]
pub struct PageResponse {
    /// Records on this page
    pub data: Vec<Record>,
    /// `total_count`, when present
    pub total_count: Option<u64>,
    /// `total_pages`, when present
    pub total_pages: Option<u32>,
}

impl PageResponse {
    /// Decode a page body: `{"data": [...], "total_count": n, "total_pages": n}`
    pub fn from_value(body: JsonValue) -> Result<Self> {
        let JsonValue::Object(mut map) = body else {
            return Err(Error::decode("page response is not a JSON object"));
        };

        let data = match map.remove("data") {
            Some(JsonValue::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    JsonValue::Object(record) => Ok(record),
                    other => Err(Error::decode(format!(
                        "expected record object in 'data', got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(Error::decode(format!("'data' is not an array: {other}")));
            }
            None => return Err(Error::decode("page response has no 'data' array")),
        };

        let total_count = map.get("total_count").and_then(JsonValue::as_u64);
        let total_pages = map
            .get("total_pages")
            .and_then(JsonValue::as_u64)
            .and_then(|n| u32::try_from(n).ok());

        Ok(Self {
            data,
            total_count,
            total_pages,
        })
    }
}
