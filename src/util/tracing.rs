use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

/// Initializes the `tracing` logging framework.
///
/// Events are written to stderr, so that stdout only contains the import
/// summary. The default level is `INFO` and can be changed with the
/// [`RUST_LOG`](tracing_subscriber::filter::EnvFilter) environment variable.
pub fn init() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    fmt()
        .compact()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
