//! Parsing and normalization of quoted nginx access log lines.
//!
//! A line goes through [`parse_line`], which splits it into its eleven raw
//! fields, and then through [`normalize`], which decodes the request path,
//! extracts the referrer domain and attaches the cached [`UserAgent`]
//! classification.

pub mod line;
pub mod normalize;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;
pub mod user_agent;

pub use crate::line::{LineFields, NUM_FIELDS, parse_line};
pub use crate::normalize::{LogEntry, NO_REFERRER, normalize};
pub use crate::user_agent::{Classifier, LoadError, UapClassifier, UserAgent, UserAgentCache};

/// Reasons a single log line can't be turned into a [`LogEntry`].
#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("Expected {expected} fields, but found {found}")]
    MalformedLine {
        expected: usize,
        found: usize,
        line: String,
    },
    #[error("Invalid {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// Tokenizes and normalizes a single log line.
pub fn parse_entry<'a, C: Classifier>(
    line: &'a str,
    user_agents: &'a mut UserAgentCache<C>,
) -> Result<LogEntry<'a>, LineError> {
    normalize(parse_line(line)?, user_agents)
}
