use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "moodtune",
    version,
    about = "Analyze a face image and pick a playlist for its mood"
)]
struct Cli {
    /// Path to the image to analyze
    image_path: PathBuf,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the report.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    tracing::debug!(?config, "configuration loaded");

    let mut analyzer = config.analyzer();
    let mut stdout = std::io::stdout().lock();
    match moodtune_core::run(analyzer.as_mut(), &cli.image_path, &config.run_settings(), &mut stdout) {
        Ok(outcome) => tracing::debug!(?outcome, "run finished"),
        Err(err) => tracing::error!(error = %err, "cannot write report to stdout"),
    }

    Ok(())
}
