//! CLI commands and argument parsing

use crate::types::{parse_day, Dataset};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// First day of the default window
pub const DEFAULT_START: &str = "2016-08-01";

/// Last day of the default window
pub const DEFAULT_END: &str = "2016-08-07";

/// Analytics ETL CLI
#[derive(Parser, Debug)]
#[command(name = "analytics-etl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format for run summaries
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract a dataset from the API into date partitions
    Extract {
        /// Dataset to extract
        #[arg(short, long, value_enum)]
        dataset: Dataset,

        /// First day (YYYY-MM-DD or YYYYMMDD)
        #[arg(long, default_value = DEFAULT_START, value_parser = parse_day_arg)]
        start: NaiveDate,

        /// Last day, inclusive (YYYY-MM-DD or YYYYMMDD)
        #[arg(long, default_value = DEFAULT_END, value_parser = parse_day_arg)]
        end: NaiveDate,

        /// Records per page (defaults to the dataset's configured limit)
        #[arg(short, long)]
        limit: Option<u32>,

        /// Partition root: local path or s3://, gs://, az:// URL
        #[arg(long)]
        data_dir: Option<String>,
    },

    /// Load date partitions into a warehouse table
    Load {
        /// Dataset the partitions hold (inferred from the table name if omitted)
        #[arg(short, long, value_enum)]
        dataset: Option<Dataset>,

        /// Dataset folder holding the date=... directories
        #[arg(short, long)]
        path: String,

        /// Warehouse project (defaults to the configured project)
        #[arg(long)]
        project: Option<String>,

        /// Destination table, dataset.table or project.dataset.table
        #[arg(short, long)]
        table: Option<String>,

        /// First day (YYYY-MM-DD or YYYYMMDD)
        #[arg(long, default_value = DEFAULT_START, value_parser = parse_day_arg)]
        start: NaiveDate,

        /// Last day, inclusive (YYYY-MM-DD or YYYYMMDD)
        #[arg(long, default_value = DEFAULT_END, value_parser = parse_day_arg)]
        end: NaiveDate,
    },

    /// Run extract and load for both datasets over the trailing week
    Run {
        /// Run date; the window ends the day before (defaults to today, UTC)
        #[arg(long, value_parser = parse_day_arg)]
        as_of: Option<NaiveDate>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

/// Clap value parser for day arguments
pub fn parse_day_arg(value: &str) -> std::result::Result<NaiveDate, String> {
    parse_day(value).map_err(|e| e.to_string())
}
