//! # Access log line tokenizer
//!
//! Lines are written by an nginx `log_format` that wraps every variable in
//! double quotes and separates them with a single space:
//!
//! ```text
//! "$host" "$http_cf_connecting_ip" "$http_cf_ipcountry" "$time_iso8601" "$status" "$request_method" "$request_uri" "$bytes_sent" "$request_time" "$http_referer" "$http_user_agent"
//! ```
//!
//! The format has no escaping for quotes inside a value, so a field that
//! contains the `" "` sequence itself will be split in two. Such a line ends
//! up with the wrong number of fields and is rejected as malformed.

use crate::LineError;
use tracing::instrument;

const QUOTE: char = '"';
const SEPARATOR: &str = r#"" ""#;

/// The number of fields in a well-formed log line.
pub const NUM_FIELDS: usize = 11;

/// The raw fields of a single log line, in log format order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineFields<'a> {
    pub host: &'a str,
    pub remote_addr: &'a str,
    pub country_code: &'a str,
    pub time: &'a str,
    pub status_code: &'a str,
    pub method: &'a str,
    pub path: &'a str,
    pub size: &'a str,
    pub response_time: &'a str,
    pub referrer: &'a str,
    pub user_agent: &'a str,
}

impl<'a> LineFields<'a> {
    /// Returns the fields in the order they appear in the log line.
    pub fn to_array(&self) -> [&'a str; NUM_FIELDS] {
        [
            self.host,
            self.remote_addr,
            self.country_code,
            self.time,
            self.status_code,
            self.method,
            self.path,
            self.size,
            self.response_time,
            self.referrer,
            self.user_agent,
        ]
    }
}

/// Splits a line into its quoted fields.
///
/// Exactly one leading and one trailing quote are removed before splitting,
/// so empty first or last fields (`""`) survive.
pub fn split_fields(line: &str) -> Vec<&str> {
    let line = line.strip_prefix(QUOTE).unwrap_or(line);
    let line = line.strip_suffix(QUOTE).unwrap_or(line);
    line.split(SEPARATOR).collect()
}

/// Tokenizes a line and checks that it has the expected number of fields.
#[instrument(level = "debug", skip(line))]
pub fn parse_line(line: &str) -> Result<LineFields<'_>, LineError> {
    let values = split_fields(line);

    let &[
        host,
        remote_addr,
        country_code,
        time,
        status_code,
        method,
        path,
        size,
        response_time,
        referrer,
        user_agent,
    ] = values.as_slice()
    else {
        return Err(LineError::MalformedLine {
            expected: NUM_FIELDS,
            found: values.len(),
            line: line.to_string(),
        });
    };

    Ok(LineFields {
        host,
        remote_addr,
        country_code,
        time,
        status_code,
        method,
        path,
        size,
        response_time,
        referrer,
        user_agent,
    })
}
