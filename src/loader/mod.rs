//! Partition loader module
//!
//! Walks the partition directories of a date range and appends every file's
//! records to a warehouse table, one load job per file.
//!
//! # Overview
//!
//! - Both `date=YYYY-MM-DD` and `date=YYYYMMDD` directories are accepted.
//! - Each row gains a `source_file` column naming the file it came from.
//! - Compact `date` values (`20160801`) are rewritten to ISO form.
//! - A file that cannot be read or loaded is logged and skipped.

mod partition_loader;
mod reader;
mod types;

pub use partition_loader::PartitionLoader;
pub use reader::{normalize_record, parse_partition_file, read_partition_file};
pub use types::LoadStats;
