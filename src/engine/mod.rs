//! Execution engine module
//!
//! Runs endpoints in catalog order and writes what they return to storage.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Orchestrates sync and reconciliation runs
//! - `SyncConfig` - Configuration for a run
//! - `RunSummary` / `EndpointStats` - what a run did
//!
//! Grad-year scoped endpoints run once per configured year. Endpoints that
//! reference universities add the ids they see to a queue; the universities
//! endpoint is looked up id by id after every other endpoint has finished.

mod types;

pub use types::{EndpointStats, RunKind, RunSummary, SyncConfig};

use crate::endpoint::{EndpointCatalog, EndpointDescriptor};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::output::StorageSink;
use crate::pagination::{FetchFilters, PagedFetcher, RecordFetcher};
use crate::reconcile::Reconciler;
use crate::state::StateManager;
use crate::transform::transform_record;
use crate::types::{id_to_string, ErrorStrategy, Record};
use crate::warehouse::WarehouseQuery;
use chrono::{NaiveDate, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Key on dependent records naming the university they refer to
const UNIVERSITY_ID_KEY: &str = "university_id";

/// Sync engine for orchestrating extraction and reconciliation
pub struct SyncEngine {
    /// HTTP client
    client: HttpClient,
    /// Endpoint catalog
    catalog: EndpointCatalog,
    /// Data lake
    sink: Arc<dyn StorageSink>,
    /// State manager
    state: StateManager,
    /// Run configuration
    config: SyncConfig,
    /// University ids seen on dependent endpoints, drained by the lookup
    university_queue: BTreeSet<String>,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(
        client: HttpClient,
        catalog: EndpointCatalog,
        sink: Arc<dyn StorageSink>,
        state: StateManager,
    ) -> Self {
        Self {
            client,
            catalog,
            sink,
            state,
            config: SyncConfig::default(),
            university_queue: BTreeSet::new(),
        }
    }

    /// Set run configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// University ids waiting for the lookup
    pub fn university_queue(&self) -> &BTreeSet<String> {
        &self.university_queue
    }

    /// Sync the selected endpoints (all when `selection` is empty)
    pub async fn sync(&mut self, selection: &[String]) -> Result<RunSummary> {
        let endpoints: Vec<EndpointDescriptor> = self
            .catalog
            .select(selection)?
            .into_iter()
            .cloned()
            .collect();
        for endpoint in endpoints.iter().filter(|e| e.has_grad_year) {
            self.config.require_grad_years(&endpoint.name)?;
        }

        let mut summary = RunSummary::start(RunKind::Sync);
        let (lookups, paged): (Vec<_>, Vec<_>) = endpoints.iter().partition(|e| e.is_lookup());

        for endpoint in paged {
            info!("Loading data from {}", endpoint.name);
            let started_at = Utc::now();
            let mut loaded = 0;
            let mut failed = false;

            for grad_year in self.years_for(endpoint) {
                let stats = match self.sync_endpoint(endpoint, grad_year).await {
                    Ok(stats) => stats,
                    Err(e) => {
                        failed = true;
                        self.handle_failure(endpoint, grad_year, e)?
                    }
                };
                loaded += stats.records;
                summary.push(stats);
            }

            if !failed {
                self.state
                    .mark_synced(&endpoint.name, started_at, loaded)
                    .await?;
            }
        }

        for endpoint in lookups {
            let started_at = Utc::now();
            let stats = match self.sync_lookup(endpoint).await {
                Ok(stats) => {
                    self.state
                        .mark_synced(&endpoint.name, started_at, stats.records)
                        .await?;
                    stats
                }
                Err(e) => self.handle_failure(endpoint, None, e)?,
            };
            summary.push(stats);
        }

        if !self.university_queue.is_empty() {
            debug!(
                "{} university ids queued but universities not selected",
                self.university_queue.len()
            );
        }

        summary.finish();
        Ok(summary)
    }

    /// Reconcile the selected grad-year scoped endpoints against the warehouse.
    ///
    /// An empty selection means every grad-year scoped endpoint.
    pub async fn reconcile(
        &mut self,
        warehouse: Arc<dyn WarehouseQuery>,
        selection: &[String],
    ) -> Result<RunSummary> {
        let endpoints: Vec<EndpointDescriptor> = self
            .catalog
            .select(selection)?
            .into_iter()
            .filter(|e| !selection.is_empty() || e.has_grad_year)
            .cloned()
            .collect();

        let mut reconciler = Reconciler::new(
            self.client.clone(),
            self.catalog.clone(),
            warehouse,
            Arc::clone(&self.sink),
        )
        .with_page_config(self.config.page_config);

        let mut summary = RunSummary::start(RunKind::Reconcile);
        for endpoint in &endpoints {
            let years = self.config.require_grad_years(&endpoint.name)?.to_vec();
            for grad_year in years {
                let stats = match reconciler.reconcile(endpoint, grad_year).await {
                    Ok(report) => EndpointStats {
                        missing: report.missing.len() as u64,
                        deleted: report.deleted,
                        ..EndpointStats::new(&endpoint.name, Some(grad_year))
                    },
                    Err(e) => self.handle_failure(endpoint, Some(grad_year), e)?,
                };
                summary.push(stats);
            }
        }

        summary.finish();
        Ok(summary)
    }

    fn years_for(&self, endpoint: &EndpointDescriptor) -> Vec<Option<u16>> {
        if endpoint.has_grad_year {
            self.config.grad_years.iter().copied().map(Some).collect()
        } else {
            vec![None]
        }
    }

    /// Apply the error strategy: `fail` propagates, `skip` records and moves on
    fn handle_failure(
        &self,
        endpoint: &EndpointDescriptor,
        grad_year: Option<u16>,
        error: Error,
    ) -> Result<EndpointStats> {
        match self.config.error_strategy {
            ErrorStrategy::Fail => Err(error),
            ErrorStrategy::Skip => {
                warn!(
                    endpoint = %endpoint.name,
                    grad_year = ?grad_year,
                    "Endpoint failed, skipping: {}",
                    error
                );
                Ok(EndpointStats {
                    error: Some(error.to_string()),
                    ..EndpointStats::new(&endpoint.name, grad_year)
                })
            }
        }
    }

    /// `updated_after` for an endpoint: explicit date, else stored state
    async fn updated_after_for(&self, endpoint: &EndpointDescriptor) -> Option<NaiveDate> {
        if !endpoint.supports_date_filter {
            return None;
        }
        if self.config.updated_after.is_some() {
            return self.config.updated_after;
        }
        if self.config.incremental {
            return self.state.updated_after(&endpoint.name).await;
        }
        None
    }

    /// Page through one endpoint and load every record
    async fn sync_endpoint(
        &mut self,
        endpoint: &EndpointDescriptor,
        grad_year: Option<u16>,
    ) -> Result<EndpointStats> {
        let mut filters = FetchFilters::none();
        if let Some(year) = grad_year {
            filters = filters.grad_year(year);
        }
        if let Some(date) = self.updated_after_for(endpoint).await {
            filters = filters.updated_after(date);
        }

        let mut stats = EndpointStats::new(&endpoint.name, grad_year);
        let mut fetcher = PagedFetcher::new(self.client.clone(), endpoint.name.clone(), filters)
            .with_config(self.config.page_config);

        while let Some(page) = fetcher.next_page().await? {
            for record in page {
                self.load_record(endpoint, grad_year, record, &mut stats)
                    .await?;
            }
        }
        stats.records = fetcher.record_count();

        info!(
            endpoint = %endpoint.name,
            grad_year = ?grad_year,
            records = stats.records,
            custom_field_rows = stats.custom_field_rows,
            "Loaded {} records from {}",
            stats.records,
            endpoint.name
        );
        Ok(stats)
    }

    /// Look up every queued university id and load the results
    async fn sync_lookup(&mut self, endpoint: &EndpointDescriptor) -> Result<EndpointStats> {
        let ids = std::mem::take(&mut self.university_queue);
        info!("Looking up {} {} records", ids.len(), endpoint.name);

        let fetcher = RecordFetcher::with_rate_limit(
            self.client.clone(),
            endpoint.name.clone(),
            &self.config.lookup_rate_limit,
        );
        let result = fetcher.fetch_all(&ids).await?;

        let mut stats = EndpointStats::new(&endpoint.name, None);
        for record in result.records {
            self.load_record(endpoint, None, record, &mut stats).await?;
            stats.records += 1;
        }
        stats.skipped = result.skipped.len() as u64;

        info!(
            endpoint = %endpoint.name,
            records = stats.records,
            skipped = stats.skipped,
            "Loaded {} records from {}",
            stats.records,
            endpoint.name
        );
        Ok(stats)
    }

    /// Queue its university, transform, then write custom field rows and the record
    async fn load_record(
        &mut self,
        endpoint: &EndpointDescriptor,
        grad_year: Option<u16>,
        record: Record,
        stats: &mut EndpointStats,
    ) -> Result<()> {
        if endpoint.has_university_id {
            if let Some(id) = record.get(UNIVERSITY_ID_KEY).and_then(id_to_string) {
                self.university_queue.insert(id);
            }
        }

        let transformed = transform_record(endpoint, record)?;

        if !transformed.custom_field_rows.is_empty() {
            if let Some(path) = endpoint.custom_field_path(&transformed.id, grad_year) {
                self.sink
                    .write_records(&path, &transformed.custom_field_rows)
                    .await?;
                stats.custom_field_rows += transformed.custom_field_rows.len() as u64;
            }
        }

        let path = endpoint.object_path(&transformed.id, grad_year);
        self.sink
            .write_records(&path, std::slice::from_ref(&transformed.record))
            .await?;
        debug!("Wrote {}", path);
        Ok(())
    }
}
