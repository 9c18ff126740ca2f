//! querychat: natural-language-to-SQL assistant
//!
//! Accepts a free-text request, asks a completion service to draft a
//! matching query against a known table schema, executes the query, and
//! returns the result set for display.
//!
//! # Features
//!
//! - Intent-to-table resolution from a declared mapping
//! - Deterministic prompt construction grounded on table definitions
//! - Policy-constrained full-schema mode with quarter-level aggregation rules
//! - Conditional query correction on a row-limiting marker
//! - Fresh-connection-per-query execution behind a pluggable provider seam
//! - Append-only session log of successful queries

pub mod config;
pub mod executor;
pub mod format;
pub mod logging;
pub mod pipeline;
pub mod schema;
pub mod session_log;

pub use config::Config;
pub use executor::{DatabaseExecutor, QueryOutcome, ResultSet};
pub use pipeline::{BlockingPipeline, QueryPipeline};
pub use schema::{SchemaStore, TableDefinition};
pub use session_log::SessionLogger;
