//! Date partitioning module
//!
//! Collected records are stored as JSON arrays, one directory per dataset and
//! calendar day:
//!
//! ```text
//! <root>/<dataset>/date=YYYY-MM-DD/part-xxxxxxxx.json
//! ```
//!
//! The root may be a local directory or an `s3://`, `gs://` or `az://` URL.

mod store;
mod types;
mod writer;

pub use store::PartitionStore;
pub use types::{
    accepted_dir_names, parse_partition_dir, partition_dir_name, partition_prefix, DateRange,
};
pub use writer::{part_file_name, PartitionWriter};
