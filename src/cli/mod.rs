//! CLI module
//!
//! Command-line interface for running the sync.
//!
//! # Commands
//!
//! - `sync` - Load records from the API into the data lake
//! - `reconcile` - Delete lake objects for records removed at the source
//! - `endpoints` - List catalog endpoints
//! - `validate` - Validate the endpoint catalog

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
