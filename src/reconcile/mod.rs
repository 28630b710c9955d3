//! Reconciliation and cascading delete
//!
//! Finds records the warehouse still holds for a graduation year that the
//! API no longer returns, and removes their objects from storage.
//!
//! ```text
//! Idle -> FetchingWarehouseIds -> EnumeratingApi -> Diffing -> DeletingCascade -> Done
//! ```
//!
//! The warehouse snapshot is taken before the API enumeration. Nothing here
//! retries: a warehouse or storage failure aborts the endpoint, whatever was
//! already deleted stays deleted, and running again is safe.

mod types;


pub use types::{diff_ids, DeleteRecord, ReconcilePhase, ReconcileReport};

use crate::endpoint::{EndpointCatalog, EndpointDescriptor, ADMISSIONS, FOLLOWINGS, STUDENTS};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::output::{DeleteOutcome, StorageSink};
use crate::pagination::{FetchFilters, PageConfig, PagedFetcher};
use crate::warehouse::WarehouseQuery;
use std::sync::Arc;
use tracing::{debug, info};

/// Drives reconciliation for grad-year scoped endpoints
pub struct Reconciler {
    client: HttpClient,
    catalog: EndpointCatalog,
    warehouse: Arc<dyn WarehouseQuery>,
    sink: Arc<dyn StorageSink>,
    page_config: PageConfig,
    phase: ReconcilePhase,
}

impl Reconciler {
    /// Create a reconciler
    pub fn new(
        client: HttpClient,
        catalog: EndpointCatalog,
        warehouse: Arc<dyn WarehouseQuery>,
        sink: Arc<dyn StorageSink>,
    ) -> Self {
        Self {
            client,
            catalog,
            warehouse,
            sink,
            page_config: PageConfig::default(),
            phase: ReconcilePhase::Idle,
        }
    }

    /// Set the page configuration used to enumerate the API
    pub fn with_page_config(mut self, config: PageConfig) -> Self {
        self.page_config = config;
        self
    }

    /// Current phase
    pub fn phase(&self) -> ReconcilePhase {
        self.phase
    }

    /// Reconcile one endpoint for one graduation year
    pub async fn reconcile(
        &mut self,
        endpoint: &EndpointDescriptor,
        grad_year: u16,
    ) -> Result<ReconcileReport> {
        if !endpoint.has_grad_year {
            return Err(Error::config(format!(
                "endpoint '{}' is not scoped by graduation year and cannot be reconciled",
                endpoint.name
            )));
        }
        info!("Running deletion workflow for {} ({})", endpoint.name, grad_year);
        self.phase = ReconcilePhase::Idle;

        let mut report = ReconcileReport {
            endpoint: endpoint.name.clone(),
            grad_year,
            ..ReconcileReport::default()
        };

        self.transition(&endpoint.name, ReconcilePhase::FetchingWarehouseIds);
        let warehouse_ids = self.warehouse.scope_ids(&endpoint.name, grad_year).await?;
        report.warehouse_count = warehouse_ids.len();

        self.transition(&endpoint.name, ReconcilePhase::EnumeratingApi);
        let api_ids = PagedFetcher::new(
            self.client.clone(),
            endpoint.name.clone(),
            FetchFilters::none().grad_year(grad_year),
        )
        .with_config(self.page_config)
        .collect_ids()
        .await?;
        report.api_count = api_ids.len();

        self.transition(&endpoint.name, ReconcilePhase::Diffing);
        report.missing = diff_ids(&warehouse_ids, &api_ids);

        self.transition(&endpoint.name, ReconcilePhase::DeletingCascade);
        if report.missing.is_empty() {
            info!("No {} records to delete", endpoint.name);
        } else {
            info!("Found {} {} record(s) to delete", report.missing.len(), endpoint.name);
        }

        for id in report.missing.clone() {
            if endpoint.name == STUDENTS {
                let record = self.student_delete_record(&id).await?;
                self.delete_student(&record, endpoint, grad_year, &mut report)
                    .await?;
            } else {
                self.delete_record(endpoint, &id, grad_year, &mut report)
                    .await?;
            }
        }

        self.transition(&endpoint.name, ReconcilePhase::Done);
        info!(
            endpoint = %endpoint.name,
            grad_year,
            missing = report.missing.len(),
            deleted = report.deleted,
            not_found = report.not_found,
            "Reconciliation complete"
        );
        Ok(report)
    }

    /// Look up a student's dependents in the warehouse
    pub async fn student_delete_record(&self, student_id: &str) -> Result<DeleteRecord> {
        Ok(DeleteRecord {
            student_id: student_id.to_string(),
            admission_ids: self.warehouse.admission_ids(student_id).await?,
            following_ids: self.warehouse.following_ids(student_id).await?,
        })
    }

    fn transition(&mut self, endpoint: &str, next: ReconcilePhase) {
        info!("{}: {} -> {}", endpoint, self.phase, next);
        self.phase = next;
    }

    /// Student object, its custom fields, each admission with its custom
    /// fields, then each following
    async fn delete_student(
        &self,
        record: &DeleteRecord,
        students: &EndpointDescriptor,
        grad_year: u16,
        report: &mut ReconcileReport,
    ) -> Result<()> {
        info!(
            "Deleting student {} ({} admissions, {} followings)",
            record.student_id,
            record.admission_ids.len(),
            record.following_ids.len()
        );
        self.delete_record(students, &record.student_id, grad_year, report)
            .await?;

        let admissions = self.catalog.require(ADMISSIONS)?;
        for id in &record.admission_ids {
            self.delete_record(admissions, id, grad_year, report).await?;
        }

        let followings = self.catalog.require(FOLLOWINGS)?;
        for id in &record.following_ids {
            self.delete_record(followings, id, grad_year, report).await?;
        }
        Ok(())
    }

    async fn delete_record(
        &self,
        endpoint: &EndpointDescriptor,
        id: &str,
        grad_year: u16,
        report: &mut ReconcileReport,
    ) -> Result<()> {
        let path = endpoint.object_path(id, Some(grad_year));
        self.delete_path(&path, report).await?;

        if let Some(path) = endpoint.custom_field_path(id, Some(grad_year)) {
            self.delete_path(&path, report).await?;
        }
        Ok(())
    }

    async fn delete_path(&self, path: &str, report: &mut ReconcileReport) -> Result<()> {
        match self.sink.delete(path).await? {
            DeleteOutcome::Deleted => {
                debug!("Deleted {}", path);
                report.deleted += 1;
            }
            DeleteOutcome::NotFound => {
                info!("Nothing stored at {}", path);
                report.not_found += 1;
            }
        }
        Ok(())
    }
}
