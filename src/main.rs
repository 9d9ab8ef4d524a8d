use anyhow::Context;
use clap::Parser;
use webstats::config::Options;
use webstats::ingest::ingest_file;
use webstats_database::SqliteSink;

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    webstats::util::tracing::init();

    let options = Options::parse();
    let classifier = options.classifier()?;

    let db_path = &options.db_path;
    let mut sink = SqliteSink::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    let summary = ingest_file(&options.log_path, &mut sink, classifier, options.trunc)?;

    println!("Time: {:.6}", summary.elapsed.as_secs_f64());
    println!("Rows inserted: {}", summary.inserted());
    println!("Rows failed: {}", summary.failed());
    println!("Truncated: {}", summary.truncated);

    Ok(())
}
