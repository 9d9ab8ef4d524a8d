use crate::line::LineFields;
use crate::user_agent::{Classifier, UserAgent, UserAgentCache};
use crate::LineError;
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::str::FromStr;
use tracing::{instrument, trace};
use url::{Position, Url};

/// The value nginx logs for `$http_referer` when the header is missing.
pub const NO_REFERRER: &str = "-";

/// A fully normalized access log entry, ready to be written to the database.
///
/// String fields borrow from the log line they were parsed from, the user
/// agent classification borrows from the [`UserAgentCache`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry<'a> {
    pub host: &'a str,
    pub remote_addr: &'a str,
    pub country_code: &'a str,
    pub time: &'a str,
    pub method: &'a str,
    pub path: Cow<'a, str>,
    pub status_code: i32,
    pub size: i64,
    pub response_time: f64,
    /// `None` if the request was logged without a referrer.
    pub referrer_url: Option<&'a str>,
    pub referrer_domain: String,
    pub ua_string: &'a str,
    pub user_agent: &'a UserAgent,
}

/// Converts the raw fields of a log line into a [`LogEntry`].
///
/// Path decoding and referrer parsing never fail; the numeric fields do if
/// they can't be parsed.
#[instrument(level = "debug", skip_all)]
pub fn normalize<'a, C: Classifier>(
    fields: LineFields<'a>,
    user_agents: &'a mut UserAgentCache<C>,
) -> Result<LogEntry<'a>, LineError> {
    let status_code = parse_field(fields.status_code, "status code")?;
    let size = parse_field(fields.size, "size")?;
    let response_time = parse_field(fields.response_time, "response time")?;

    let referrer_url = (fields.referrer != NO_REFERRER).then_some(fields.referrer);

    Ok(LogEntry {
        host: fields.host,
        remote_addr: fields.remote_addr,
        country_code: fields.country_code,
        time: fields.time,
        method: fields.method,
        path: decode_path(fields.path),
        status_code,
        size,
        response_time,
        referrer_url,
        referrer_domain: referrer_domain(fields.referrer),
        ua_string: fields.user_agent,
        user_agent: user_agents.classify(fields.user_agent),
    })
}

fn parse_field<T: FromStr>(value: &str, field: &'static str) -> Result<T, LineError> {
    value.parse().map_err(|_| LineError::InvalidField {
        field,
        value: value.to_string(),
    })
}

/// Decodes a percent-encoded request URI.
///
/// `+` is decoded to a space. If the URI contains an incomplete or invalid
/// escape sequence, or decodes to invalid UTF-8, it is returned unchanged.
pub fn decode_path(path: &str) -> Cow<'_, str> {
    if !path.contains(['%', '+']) {
        return Cow::Borrowed(path);
    }

    if !has_valid_escapes(path) {
        trace!(%path, "Keeping path with invalid percent-encoding");
        return Cow::Borrowed(path);
    }

    let unplussed = path.replace('+', " ");
    match percent_decode_str(&unplussed).decode_utf8() {
        Ok(decoded) => Cow::Owned(decoded.into_owned()),
        Err(error) => {
            trace!(%path, %error, "Keeping path that does not decode to UTF-8");
            Cow::Borrowed(path)
        }
    }
}

fn has_valid_escapes(path: &str) -> bool {
    let bytes = path.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

/// Extracts the host (and port) of a referrer URL, as it was written.
///
/// Returns an empty string for the `-` placeholder and for anything that is
/// not an absolute URL with a host. The host keeps its original case, and an
/// explicit port is kept even if it is the default port of the scheme.
pub fn referrer_domain(referrer: &str) -> String {
    let Ok(url) = Url::parse(referrer) else {
        return String::new();
    };

    if url.host_str().is_none_or(str::is_empty) {
        return String::new();
    }

    match raw_authority(referrer) {
        Some(authority) => authority.to_string(),
        None => url[Position::BeforeHost..Position::AfterPort].to_string(),
    }
}

/// The `host[:port]` part of an URL without any userinfo.
fn raw_authority(url: &str) -> Option<&str> {
    let (_, rest) = url.trim().split_once("://")?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];
    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    (!host.is_empty()).then_some(host)
}
