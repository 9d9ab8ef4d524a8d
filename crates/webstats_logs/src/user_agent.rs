use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;
use std::{fs, io};
use tracing::{debug, instrument};
use uaparser::{Parser, UserAgentParser};

/// The family reported for user agents that no classification rule matches.
pub const OTHER: &str = "Other";

/// Browser, operating system and device information derived from a
/// `User-Agent` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgent {
    pub client_family: String,
    pub client_version: Option<i32>,
    pub os_family: String,
    pub os_version: Option<i32>,
    pub device_family: String,
    pub device_brand: String,
    pub device_model: String,
}

impl UserAgent {
    /// The classification of a user agent that nothing is known about.
    pub fn other() -> Self {
        Self {
            client_family: OTHER.to_string(),
            client_version: None,
            os_family: OTHER.to_string(),
            os_version: None,
            device_family: OTHER.to_string(),
            device_brand: String::new(),
            device_model: String::new(),
        }
    }
}

/// Something that can turn a raw `User-Agent` header into a [`UserAgent`].
pub trait Classifier: Debug {
    fn classify(&self, user_agent: &str) -> UserAgent;
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn classify(&self, user_agent: &str) -> UserAgent {
        (**self).classify(user_agent)
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn classify(&self, user_agent: &str) -> UserAgent {
        (**self).classify(user_agent)
    }
}

/// The uap-core `regexes.yaml` this crate is built with.
const BUNDLED_REGEXES: &[u8] = include_bytes!("../regexes.yaml");

/// A [`Classifier`] backed by the [uap-core](https://github.com/ua-parser/uap-core)
/// regular expressions.
pub struct UapClassifier {
    parser: UserAgentParser,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read user agent regexes")]
    Io(#[from] io::Error),
    #[error("Failed to parse user agent regexes: {0}")]
    Parse(String),
}

impl UapClassifier {
    /// Loads the classification rules that are bundled with this crate.
    #[instrument]
    pub fn bundled() -> Result<Self, LoadError> {
        Self::from_bytes(BUNDLED_REGEXES)
    }

    /// Loads the classification rules from a uap-core `regexes.yaml` file.
    #[instrument]
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        let parser = UserAgentParser::from_bytes(bytes)
            .map_err(|error| LoadError::Parse(format!("{error:?}")))?;

        Ok(Self { parser })
    }
}

impl Debug for UapClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UapClassifier").finish_non_exhaustive()
    }
}

impl Classifier for UapClassifier {
    fn classify(&self, user_agent: &str) -> UserAgent {
        let client = self.parser.parse(user_agent);

        UserAgent {
            client_family: client.user_agent.family.to_string(),
            client_version: parse_major(client.user_agent.major.as_deref()),
            os_family: client.os.family.to_string(),
            os_version: parse_major(client.os.major.as_deref()),
            device_family: client.device.family.to_string(),
            device_brand: client.device.brand.as_deref().unwrap_or_default().to_string(),
            device_model: client.device.model.as_deref().unwrap_or_default().to_string(),
        }
    }
}

/// Major versions are stored as integers, anything non-numeric is dropped.
fn parse_major(major: Option<&str>) -> Option<i32> {
    major.and_then(|major| major.parse().ok())
}

/// Memoizes [`Classifier`] results by the exact `User-Agent` string.
///
/// The cache lives for a single import run and is never evicted. Access logs
/// repeat a small set of user agents over and over, so the number of entries
/// stays far below the number of lines.
pub struct UserAgentCache<C> {
    classifier: C,
    entries: HashMap<String, UserAgent>,
    misses: u64,
}

impl<C: Classifier> UserAgentCache<C> {
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            entries: HashMap::new(),
            misses: 0,
        }
    }

    /// Returns the classification for `user_agent`, running the classifier
    /// only the first time a string is seen.
    pub fn classify(&mut self, user_agent: &str) -> &UserAgent {
        if !self.entries.contains_key(user_agent) {
            debug!(%user_agent, "Classifying new user agent");
            let classified = self.classifier.classify(user_agent);
            self.entries.insert(user_agent.to_string(), classified);
            self.misses += 1;
        }

        &self.entries[user_agent]
    }

    /// The number of distinct user agents seen so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The number of times the classifier was invoked.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }
}

impl<C> Debug for UserAgentCache<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAgentCache")
            .field("len", &self.entries.len())
            .field("misses", &self.misses)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use claims::{assert_none, assert_ok};
    use insta::assert_debug_snapshot;

    const FIREFOX: &str =
        "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";

    #[test]
    fn test_cache_hit() {
        let mut cache = UserAgentCache::new(CountingClassifier::default());

        let first = cache.classify(FIREFOX).clone();
        let second = cache.classify(FIREFOX).clone();

        assert_eq!(first, second);
        assert_eq!(cache.classifier().calls(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_distinct_strings() {
        let mut cache = UserAgentCache::new(CountingClassifier::default());

        cache.classify("curl/8.5.0");
        cache.classify("curl/8.5.0 ");
        cache.classify("Curl/8.5.0");
        cache.classify("curl/8.5.0");

        assert_eq!(cache.classifier().calls(), 3);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.classify("curl/8.5.0 ").client_family, "curl/8.5.0 ");
    }

    #[test]
    fn test_bundled_classifier() {
        let classifier = assert_ok!(UapClassifier::bundled());

        assert_debug_snapshot!(classifier.classify(FIREFOX), @r#"
        UserAgent {
            client_family: "Firefox",
            client_version: Some(
                121,
            ),
            os_family: "Linux",
            os_version: None,
            device_family: "Other",
            device_brand: "",
            device_model: "",
        }
        "#);

        let curl = classifier.classify("curl/8.5.0");
        assert_eq!(curl.client_family, "curl");
        assert_eq!(curl.client_version, Some(8));
    }

    #[test]
    fn test_unclassified() {
        let mut cache = UserAgentCache::new(Unclassified);
        assert_debug_snapshot!(cache.classify(FIREFOX), @r#"
        UserAgent {
            client_family: "Other",
            client_version: None,
            os_family: "Other",
            os_version: None,
            device_family: "Other",
            device_brand: "",
            device_model: "",
        }
        "#);
    }

    #[test]
    fn test_parse_major() {
        assert_eq!(parse_major(Some("121")), Some(121));
        assert_none!(parse_major(Some("beta")));
        assert_none!(parse_major(Some("")));
        assert_none!(parse_major(None));
    }

    #[test]
    fn test_uap_classifier() {
        let regexes = r#"
user_agent_parsers:
  - regex: '(Firefox)/(\d+)\.(\d+)'
os_parsers:
  - regex: '(Linux)'
device_parsers:
  - regex: '(iPhone)'
    device_replacement: 'iPhone'
    brand_replacement: 'Apple'
    model_replacement: 'iPhone'
"#;
        let classifier = assert_ok!(UapClassifier::from_bytes(regexes.as_bytes()));

        let firefox = classifier.classify(FIREFOX);
        assert_eq!(firefox.client_family, "Firefox");
        assert_eq!(firefox.client_version, Some(121));
        assert_eq!(firefox.os_family, "Linux");
        assert_none!(firefox.os_version);
        assert_eq!(firefox.device_family, OTHER);

        let unknown = classifier.classify("curl/8.5.0");
        assert_eq!(unknown.client_family, OTHER);
        assert_none!(unknown.client_version);
        assert_eq!(unknown.os_family, OTHER);
    }
}
