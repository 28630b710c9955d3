//! Paged endpoint fetcher
//!
//! Walks `{endpoint}?<filters>&limit=N[&page=n]` one page at a time until
//! the server-reported page total is passed. Totals are captured from the
//! first page that carries them and never recomputed, so pages are always
//! requested strictly one after another. Every page request is paced through
//! the client, so the gap also holds between consecutive fetch sessions.

use super::types::{FetchFilters, PageConfig, PageResponse, PageState};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::types::{record_id, Record};
use futures::{Stream, TryStreamExt};
use std::collections::HashSet;
use tracing::{debug, info};

/// Sequential page-by-page fetcher for one endpoint
#[derive(Debug)]
pub struct PagedFetcher {
    client: HttpClient,
    endpoint: String,
    filters: FetchFilters,
    config: PageConfig,
    state: PageState,
}

impl PagedFetcher {
    /// Create a fetcher positioned at page 1
    pub fn new(client: HttpClient, endpoint: impl Into<String>, filters: FetchFilters) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            filters,
            config: PageConfig::default(),
            state: PageState::new(),
        }
    }

    /// Set page size and pacing
    #[must_use]
    pub fn with_config(mut self, config: PageConfig) -> Self {
        self.config = config;
        self
    }

    /// Current page bookkeeping
    pub fn state(&self) -> &PageState {
        &self.state
    }

    /// Records received so far
    pub fn record_count(&self) -> u64 {
        self.state.record_count
    }

    /// Endpoint name
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// URL of the current page, relative to the API root
    pub fn page_url(&self) -> String {
        let query = self.filters.query_string(self.config.page_size);
        if self.state.current_page == 1 {
            format!("{}?{query}", self.endpoint)
        } else {
            format!("{}?{query}&page={}", self.endpoint, self.state.current_page)
        }
    }

    /// Fetch the next page, or `None` once every page has been read
    pub async fn next_page(&mut self) -> Result<Option<Vec<Record>>> {
        if self.state.is_complete() {
            return Ok(None);
        }

        if !self.config.page_delay.is_zero() {
            self.client.pace(self.config.page_delay).await;
        }

        let url = self.page_url();
        let body = self.client.get_json(&url).await?;
        let page = PageResponse::from_value(body)?;

        self.state.add_records(page.data.len());

        if !self.state.totals_known() {
            let total_pages = page.total_pages.ok_or_else(|| {
                Error::decode(format!(
                    "{} page {} has no total_pages",
                    self.endpoint, self.state.current_page
                ))
            })?;
            self.state
                .set_totals(page.total_count.unwrap_or_default(), total_pages);
        }

        debug!(
            "Fetched {} page {} of {}",
            self.endpoint,
            self.state.current_page,
            self.state.total_pages.unwrap_or_default()
        );
        self.state.advance();

        Ok(Some(page.data))
    }

    /// Consume the fetcher as a stream of records in page order
    pub fn into_stream(self) -> impl Stream<Item = Result<Record>> {
        futures::stream::try_unfold(self, |mut fetcher| async move {
            let page = fetcher.next_page().await?;
            Ok::<_, Error>(page.map(|page| (page, fetcher)))
        })
        .map_ok(|page| futures::stream::iter(page.into_iter().map(Ok::<Record, Error>)))
        .try_flatten()
    }

    /// Enumerate every page and collect record ids as strings
    pub async fn collect_ids(mut self) -> Result<HashSet<String>> {
        let mut ids = HashSet::new();
        while let Some(page) = self.next_page().await? {
            for record in &page {
                let id = record_id(record).ok_or_else(|| Error::MissingRecordId {
                    endpoint: self.endpoint.clone(),
                })?;
                ids.insert(id);
            }
        }
        info!(
            "Enumerated {} ids from {} ({} records)",
            ids.len(),
            self.endpoint,
            self.state.record_count
        );
        Ok(ids)
    }
}
