//! Imports nginx access logs into a SQLite database.
//!
//! Every line of the log is tokenized and normalized by [`webstats_logs`] and
//! then written to the `entries` table via [`webstats_database`]. The whole
//! file is imported in a single transaction, see [`ingest::ingest_file`].

#[macro_use]
extern crate tracing;

pub mod config;
pub mod ingest;
pub mod util;
