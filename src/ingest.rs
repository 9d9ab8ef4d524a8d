//! The import pipeline: read the access log line by line, normalize every
//! line and write the result to the database in one transaction.

mod batch_writer;

pub use self::batch_writer::{BatchStats, BatchWriter};

use anyhow::Context;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek};
use std::path::Path;
use std::time::{Duration, Instant};
use webstats_database::EntrySink;
use webstats_logs::{Classifier, LineError, UserAgentCache, parse_entry};

/// Counters for the lines read from the access log.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadStats {
    /// Non-empty lines read.
    pub lines: u64,
    /// Lines that did not have the expected number of fields.
    pub malformed: u64,
    /// Lines with a status code, size or response time that isn't a number.
    pub invalid: u64,
    /// Whether reading stopped early because of an I/O error.
    pub read_error: bool,
}

/// The result of a completed import.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub read: ReadStats,
    pub batch: BatchStats,
    pub elapsed: Duration,
    pub truncated: bool,
}

impl Summary {
    pub fn inserted(&self) -> u64 {
        self.batch.inserted
    }

    /// Lines that were read but not inserted, for whatever reason.
    pub fn failed(&self) -> u64 {
        self.read.malformed + self.read.invalid + self.batch.failed
    }
}

/// Imports the access log at `path` into `sink`.
///
/// Steps, in order:
///
/// 1. open the log file (writable too if `truncate` is set)
/// 2. begin the transaction
/// 3. insert every line, skipping lines that fail
/// 4. commit the transaction
/// 5. truncate the log file, if requested
///
/// Failing to open the file, begin or commit the transaction aborts the
/// import. The log file is only truncated after a successful commit.
#[instrument(skip(sink, classifier))]
pub fn ingest_file<S, C>(
    path: &Path,
    sink: S,
    classifier: C,
    truncate: bool,
) -> anyhow::Result<Summary>
where
    S: EntrySink,
    C: Classifier,
{
    let mut file = OpenOptions::new()
        .read(true)
        .write(truncate)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let start = Instant::now();

    let mut writer = BatchWriter::begin(sink).context("Failed to begin transaction")?;
    let mut user_agents = UserAgentCache::new(classifier);

    let read = ingest_lines(BufReader::new(&file), &mut writer, &mut user_agents);
    debug!(user_agents = user_agents.len(), "Finished reading {}", path.display());

    let batch = writer.commit().context("Failed to commit transaction")?;
    let elapsed = start.elapsed();

    info!(
        inserted = batch.inserted,
        failed_inserts = batch.failed,
        malformed = read.malformed,
        invalid = read.invalid,
        ?elapsed,
        "Committed entries from {}",
        path.display()
    );

    let truncated = truncate && truncate_log(&mut file, path);

    Ok(Summary {
        read,
        batch,
        elapsed,
        truncated,
    })
}

/// Reads `reader` to the end and writes each valid line to `writer`.
///
/// An I/O error stops reading, but what was read up to that point is still
/// written.
pub fn ingest_lines<R, S, C>(
    reader: R,
    writer: &mut BatchWriter<S>,
    user_agents: &mut UserAgentCache<C>,
) -> ReadStats
where
    R: BufRead,
    S: EntrySink,
    C: Classifier,
{
    let mut stats = ReadStats::default();

    for (index, line) in reader.split(b'\n').enumerate() {
        let line_number = index as u64 + 1;

        let bytes = match line {
            Ok(bytes) => bytes,
            Err(error) => {
                error!(line_number, %error, "Failed to read log file, committing the lines read so far");
                stats.read_error = true;
                break;
            }
        };

        let text = String::from_utf8_lossy(&bytes);
        let line = text.strip_suffix('\r').unwrap_or(&text);
        if line.is_empty() {
            continue;
        }

        stats.lines += 1;

        match parse_entry(line, user_agents) {
            Ok(entry) => {
                writer.write(line_number, &entry);
            }
            Err(error @ LineError::MalformedLine { .. }) => {
                warn!(line_number, %error, "Skipping malformed line");
                stats.malformed += 1;
            }
            Err(error @ LineError::InvalidField { .. }) => {
                warn!(line_number, %error, "Skipping line with invalid field");
                stats.invalid += 1;
            }
        }
    }

    stats
}

/// Empties the log file, returning whether that worked.
///
/// The entries are already committed at this point, so a failure here is
/// reported but does not fail the import.
fn truncate_log(file: &mut File, path: &Path) -> bool {
    fn truncate(file: &mut File) -> io::Result<()> {
        file.set_len(0)?;
        file.rewind()?;
        file.sync_all()
    }

    match truncate(file) {
        Ok(()) => {
            info!("Truncated {}", path.display());
            true
        }
        Err(error) => {
            error!(%error, "Failed to truncate {}", path.display());
            false
        }
    }
}
