//! CLI commands and argument parsing

use crate::types::ErrorStrategy;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sync Overgrad records into the data lake and reconcile deletions
#[derive(Parser, Debug)]
#[command(name = "overgrad-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Endpoint catalog file (YAML); the built-in catalog when omitted
    #[arg(short, long, global = true)]
    pub catalog: Option<PathBuf>,

    /// State file (JSON) for incremental syncs
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load records from the API into the data lake
    Sync {
        /// Endpoints to sync (comma-separated, empty = all)
        #[arg(long, value_delimiter = ',')]
        endpoints: Vec<String>,

        /// Graduation years for grad-year scoped endpoints (comma-separated)
        #[arg(long, value_delimiter = ',')]
        grad_years: Vec<u16>,

        /// Only fetch records updated after this date (YYYY-MM-DD)
        #[arg(long)]
        updated_after: Option<NaiveDate>,

        /// Use each endpoint's last successful sync as `updated_after`
        #[arg(long)]
        incremental: bool,

        /// What to do when an endpoint fails
        #[arg(long, value_enum, default_value_t = ErrorStrategy::Fail)]
        error_strategy: ErrorStrategy,

        /// Destination (local path or cloud URL); overrides BUCKET
        /// Supports: /path, s3://bucket/path, r2://bucket/path, gs://bucket/path, az://container/path
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Delete lake objects for records the API no longer returns
    Reconcile {
        /// Endpoints to reconcile (comma-separated, empty = all grad-year scoped)
        #[arg(long, value_delimiter = ',')]
        endpoints: Vec<String>,

        /// Graduation years to reconcile (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        grad_years: Vec<u16>,

        /// What to do when an endpoint fails
        #[arg(long, value_enum, default_value_t = ErrorStrategy::Fail)]
        error_strategy: ErrorStrategy,

        /// Destination (local path or cloud URL); overrides BUCKET
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List endpoints in the catalog
    Endpoints,

    /// Validate the endpoint catalog
    Validate,
}
