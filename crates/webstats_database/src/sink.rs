use crate::models::NewEntry;
use diesel::ConnectionError;
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use webstats_logs::LogEntry;

/// Destination for normalized log entries.
///
/// All inserts between [`begin`](EntrySink::begin) and
/// [`commit`](EntrySink::commit) belong to one transaction. A failed
/// [`insert`](EntrySink::insert) only affects that entry; the transaction
/// stays usable.
pub trait EntrySink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn begin(&mut self) -> Result<(), Self::Error>;

    fn insert(&mut self, entry: &LogEntry<'_>) -> Result<(), Self::Error>;

    fn commit(&mut self) -> Result<(), Self::Error>;
}

impl<S: EntrySink + ?Sized> EntrySink for &mut S {
    type Error = S::Error;

    fn begin(&mut self) -> Result<(), Self::Error> {
        (**self).begin()
    }

    fn insert(&mut self, entry: &LogEntry<'_>) -> Result<(), Self::Error> {
        (**self).insert(entry)
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        (**self).commit()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Database path is not valid UTF-8: {}", .0.display())]
    InvalidPath(PathBuf),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Query(#[from] diesel::result::Error),
}

/// An [`EntrySink`] writing to the `entries` table of a SQLite database.
///
/// Dropping the sink closes the connection, which discards a transaction
/// that was not committed yet.
pub struct SqliteSink {
    conn: SqliteConnection,
}

impl SqliteSink {
    /// Opens (or creates) the database file at `path` and makes sure the
    /// `entries` table exists.
    #[instrument]
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let url = path
            .to_str()
            .ok_or_else(|| SinkError::InvalidPath(path.to_path_buf()))?;

        Self::establish(url)
    }

    /// Opens a private in-memory database.
    pub fn in_memory() -> Result<Self, SinkError> {
        Self::establish(":memory:")
    }

    fn establish(url: &str) -> Result<Self, SinkError> {
        let mut conn = SqliteConnection::establish(url)?;
        crate::create_schema(&mut conn)?;
        debug!(%url, "Database schema is ready");

        Ok(Self { conn })
    }

    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}

impl EntrySink for SqliteSink {
    type Error = SinkError;

    fn begin(&mut self) -> Result<(), SinkError> {
        AnsiTransactionManager::begin_transaction(&mut self.conn)?;
        Ok(())
    }

    fn insert(&mut self, entry: &LogEntry<'_>) -> Result<(), SinkError> {
        NewEntry::from(entry).insert(&mut self.conn)?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SinkError> {
        AnsiTransactionManager::commit_transaction(&mut self.conn)?;
        Ok(())
    }
}
