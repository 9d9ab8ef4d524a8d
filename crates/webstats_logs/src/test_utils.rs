use crate::user_agent::{Classifier, UserAgent};
use std::cell::Cell;
use tracing::dispatcher::DefaultGuard;
use tracing::subscriber;
use tracing_subscriber::fmt;

/// Enable tracing output for tests.
///
/// The tracing test output is only enabled as long as the returned guard
/// is not dropped.
pub fn enable_tracing_output() -> DefaultGuard {
    subscriber::set_default(fmt().compact().with_test_writer().finish())
}

/// Classifies every user agent as [`UserAgent::other`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Unclassified;

impl Classifier for Unclassified {
    fn classify(&self, _user_agent: &str) -> UserAgent {
        UserAgent::other()
    }
}

/// A classifier that uses the raw user agent as the client family and
/// counts how often it was called.
#[derive(Debug, Default)]
pub struct CountingClassifier {
    calls: Cell<u64>,
}

impl CountingClassifier {
    pub fn calls(&self) -> u64 {
        self.calls.get()
    }
}

impl Classifier for CountingClassifier {
    fn classify(&self, user_agent: &str) -> UserAgent {
        self.calls.set(self.calls.get() + 1);

        UserAgent {
            client_family: user_agent.to_string(),
            ..UserAgent::other()
        }
    }
}
