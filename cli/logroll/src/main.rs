//! logroll CLI
//!
//! Rolls S3 server access logs up into per-day tarballs.

use clap::Parser;

mod args;
mod event;
mod format;
mod logging;
mod run;

use args::Cli;
use run::Report;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Logs go to stderr, so stdout is clean for --dry-run tasks
    logging::init_logging(args.log_level)?;

    let report = run::execute(args).await?;

    let (lines, partial_failure) = match &report {
        Report::Producer(stats) => (format::producer_summary(stats), stats.has_errors()),
        Report::Worker(stats) => (format::worker_summary(stats), stats.has_failures()),
    };

    eprintln!();
    for line in lines {
        eprintln!("{line}");
    }

    if partial_failure {
        std::process::exit(4); // Partial failure
    }

    Ok(())
}
