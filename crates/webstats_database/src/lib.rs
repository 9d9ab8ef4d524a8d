//! SQLite storage for normalized access log entries.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;

pub mod models;
pub mod schema;
mod sink;

pub use crate::models::{Entry, NewEntry};
pub use crate::sink::{EntrySink, SinkError, SqliteSink};

/// Creates the `entries` table if it does not exist yet.
///
/// Existing tables are left untouched, there are no migrations.
pub const CREATE_SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;

CREATE TABLE IF NOT EXISTS entries (
    host TEXT,
    remote_addr TEXT,
    country_code TEXT,
    time TEXT,
    method TEXT,
    path TEXT,
    status_code INT,
    size INT,
    response_time REAL,
    referrer_url TEXT,
    referrer_domain TEXT,
    ua_string TEXT,
    ua_client_family TEXT,
    ua_client_version INT,
    ua_os_family TEXT,
    ua_os_version INT,
    ua_device_family TEXT,
    ua_device_brand TEXT,
    ua_device_model TEXT
);
"#;

pub fn create_schema(conn: &mut SqliteConnection) -> QueryResult<()> {
    conn.batch_execute(CREATE_SCHEMA)
}
