//! CLI module
//!
//! Command-line interface for the pipeline.
//!
//! # Commands
//!
//! - `extract` - Pull one dataset from the API into date partitions
//! - `load` - Append a dataset folder's partitions to a warehouse table
//! - `run` - Extract and load both datasets for the trailing week

mod commands;
mod runner;

pub use commands::{parse_day_arg, Cli, Commands, OutputFormat, DEFAULT_END, DEFAULT_START};
pub use runner::{resolve_dataset, Runner};
