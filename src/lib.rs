// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # overgrad-sync
//!
//! Incrementally copies Overgrad API records into an object-storage data
//! lake, and removes lake objects for records deleted at the source.
//!
//! ## Features
//!
//! - **Paged extraction**: page-numbered listing with fixed pacing and
//!   connection retry
//! - **Record transform**: nested object flattening, custom field rows,
//!   field projection
//! - **Data lake output**: one ndjson object per record on S3, R2, GCS,
//!   Azure or local disk
//! - **Reconciliation**: warehouse vs. API diff with cascading deletes
//! - **Incremental sync**: per-endpoint `updated_after` state
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use overgrad_sync::{EndpointCatalog, SyncConfig, SyncEngine, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let settings = overgrad_sync::config::Settings::from_env()?;
//!     let client = overgrad_sync::http::HttpClient::with_config(settings.http_config())?;
//!     let sink = std::sync::Arc::new(overgrad_sync::output::ObjectStoreSink::parse("gs://lake")?);
//!
//!     let mut engine = SyncEngine::new(
//!         client,
//!         EndpointCatalog::builtin()?,
//!         sink,
//!         overgrad_sync::state::StateManager::in_memory(),
//!     )
//!     .with_config(SyncConfig::new().with_grad_years([2025]));
//!
//!     let summary = engine.sync(&[]).await?;
//!     println!("{}", summary.to_json_pretty()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           SyncEngine                             │
//! │  sync(endpoints) → RunSummary     reconcile(warehouse) → Summary │
//! └──────────────────────────────────────────────────────────────────┘
//!                                 │
//! ┌───────────┬────────────┬──────┴──────┬────────────┬──────────────┐
//! │ Endpoint  │   HTTP     │  Paginate   │ Transform  │   Output     │
//! ├───────────┼────────────┼─────────────┼────────────┼──────────────┤
//! │ Catalog   │ ApiKey     │ Page number │ Flatten    │ ndjson       │
//! │ YAML      │ Retry      │ Lookup      │ Custom     │ object_store │
//! │           │ Rate limit │             │ Project    │              │
//! └───────────┴────────────┴─────────────┴────────────┴──────────────┘
//!        Reconcile: Warehouse (DuckDB) − API ids → cascading delete
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Endpoint descriptors and the catalog
pub mod endpoint;

/// HTTP client with retry and rate limiting
pub mod http;

/// Paged and by-id fetching
pub mod pagination;

/// Record flattening and projection
pub mod transform;

/// Data lake output
pub mod output;

/// Warehouse id queries
pub mod warehouse;

/// Reconciliation and cascading delete
pub mod reconcile;

/// Incremental sync state
pub mod state;

/// Run orchestration
pub mod engine;

/// Run notifications
pub mod notify;

/// Process settings from the environment
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use endpoint::{EndpointCatalog, EndpointDescriptor};
pub use engine::{RunSummary, SyncConfig, SyncEngine};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
