//! Pagination module
//!
//! Two fetch strategies share the HTTP client's request and retry path:
//!
//! - [`PagedFetcher`] walks a page-numbered listing until `total_pages`
//! - [`RecordFetcher`] looks records up one id at a time
//!
//! # Overview
//!
//! The paged listing answers with `data`, `total_count` and `total_pages`.
//! Totals are read from the first page only. The first request carries the
//! filters and `limit`; every later one adds `page=<n>`.

mod fetcher;
mod lookup;
mod types;

pub use fetcher::PagedFetcher;
pub use lookup::{LookupResult, RecordFetcher};
pub use types::{
    FetchFilters, PageConfig, PageResponse, PageState, DEFAULT_PAGE_DELAY, DEFAULT_PAGE_SIZE,
};
