use anyhow::Context;
use std::path::PathBuf;
use webstats_logs::{Classifier, UapClassifier};

#[derive(Debug, Clone, clap::Parser)]
#[command(
    name = "webstats",
    about = "Import an nginx access log into a SQLite database.",
    after_help = "The log lines are expected in the quoted format \
        `\"$host\" \"$http_cf_connecting_ip\" \"$http_cf_ipcountry\" \"$time_iso8601\" \
        \"$status\" \"$request_method\" \"$request_uri\" \"$bytes_sent\" \"$request_time\" \
        \"$http_referer\" \"$http_user_agent\"`."
)]
pub struct Options {
    /// Path to the SQLite database file
    #[arg(long = "db", env = "WEBSTATS_DB", default_value = "webstats.db")]
    pub db_path: PathBuf,

    /// Path to the access log file
    #[arg(long = "log", env = "WEBSTATS_LOG", default_value = "access.log")]
    pub log_path: PathBuf,

    /// Truncate the access log after its entries have been committed
    #[arg(long, env = "WEBSTATS_TRUNC")]
    pub trunc: bool,

    /// Path to a uap-core `regexes.yaml` file used to classify user agents,
    /// instead of the rules bundled with webstats
    #[arg(long, env = "WEBSTATS_UA_REGEXES")]
    pub ua_regexes: Option<PathBuf>,
}

impl Options {
    /// Builds the user agent classifier for this run.
    pub fn classifier(&self) -> anyhow::Result<Box<dyn Classifier>> {
        let Some(path) = &self.ua_regexes else {
            let classifier =
                UapClassifier::bundled().context("Failed to load bundled user agent regexes")?;
            return Ok(Box::new(classifier));
        };

        let classifier = UapClassifier::from_file(path)
            .with_context(|| format!("Failed to load user agent regexes from {}", path.display()))?;

        Ok(Box::new(classifier))
    }
}
