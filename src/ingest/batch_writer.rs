use webstats_database::EntrySink;
use webstats_logs::LogEntry;

/// Writes entries to an [`EntrySink`] inside a single transaction.
///
/// A failing insert is logged and counted, but neither aborts the
/// transaction nor stops the import. Only [`commit`](Self::commit) can fail
/// the batch as a whole.
#[derive(Debug)]
pub struct BatchWriter<S> {
    sink: S,
    inserted: u64,
    failed: u64,
}

impl<S: EntrySink> BatchWriter<S> {
    /// Opens the transaction on `sink`.
    pub fn begin(mut sink: S) -> Result<Self, S::Error> {
        sink.begin()?;

        Ok(Self {
            sink,
            inserted: 0,
            failed: 0,
        })
    }

    /// Inserts a single entry, returning whether it was written.
    pub fn write(&mut self, line_number: u64, entry: &LogEntry<'_>) -> bool {
        match self.sink.insert(entry) {
            Ok(()) => {
                self.inserted += 1;
                true
            }
            Err(error) => {
                warn!(line_number, %error, "Failed to insert entry");
                self.failed += 1;
                false
            }
        }
    }

    pub fn inserted(&self) -> u64 {
        self.inserted
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// Commits the transaction and returns the final counts.
    pub fn commit(mut self) -> Result<BatchStats, S::Error> {
        self.sink.commit()?;

        Ok(BatchStats {
            inserted: self.inserted,
            failed: self.failed,
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub inserted: u64,
    pub failed: u64,
}
