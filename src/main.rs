// Allow common clippy pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! Analytics ETL CLI
//!
//! Extracts analytics data into date partitions and loads it into the warehouse

use analytics_etl::cli::{Cli, Runner};
use clap::Parser;
use tracing::{error, warn};

/// Exit status after Ctrl-C
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let runner = Runner::new(cli);

    tokio::select! {
        result = runner.run() => {
            if let Err(e) = result {
                error!("{e}");
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Process interrupted by user.");
            std::process::exit(EXIT_INTERRUPTED);
        }
    }
}
