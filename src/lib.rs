// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Analytics ETL
//!
//! Pulls paginated analytics data from a REST gateway, stores it as
//! date-partitioned JSON and appends it to columnar warehouse tables.
//!
//! ## Features
//!
//! - **Paginated extraction**: page-number walking with typed 429 backoff
//! - **Day partitions**: `<dataset>/date=YYYY-MM-DD/part-xxxxxxxx.json` on local disk or blob storage
//! - **Incremental loads**: one append-only load job per partition file, tagged with its source
//! - **Pipeline runs**: extract and load both datasets over a trailing week with step timeouts and retries
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use analytics_etl::{Dataset, PipelineConfig, Result};
//! use analytics_etl::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = PipelineConfig::from_file("pipeline.yaml")?;
//!     let pipeline = Pipeline::from_config(config)?;
//!
//!     let today = chrono::Utc::now().date_naive();
//!     let report = pipeline.run(today).await?;
//!     println!("{} steps completed", report.steps.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                   Pipeline / CLI                              │
//! │  extract(daily) → load(daily) → extract(ga) → load(ga)        │
//! └───────────────────────────────────────────────────────────────┘
//!                                │
//! ┌───────────┬──────────────┬───┴─────────┬───────────┬──────────┐
//! │   HTTP    │  Pagination  │   Extract   │ Partition │  Loader  │
//! ├───────────┼──────────────┼─────────────┼───────────┼──────────┤
//! │ API key   │ Page number  │ Day by day  │ date=...  │ Walk days│
//! │ Rate limit│ 429 backoff  │ Filters     │ object    │ Normalize│
//! │ Timeouts  │ Short page   │             │ store     │ Warehouse│
//! └───────────┴──────────────┴─────────────┴───────────┴──────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: document public struct fields before 1.0

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the pipeline
pub mod error;

/// Common types and type aliases
pub mod types;

/// Pipeline configuration
pub mod config;

/// HTTP client with rate limiting
pub mod http;

/// Page-number pagination with backoff
pub mod pagination;

/// Date ranges, partition storage and the partition writer
pub mod partition;

/// Day-by-day extraction
pub mod extract;

/// Table schemas, load jobs and the DuckDB warehouse
pub mod warehouse;

/// Partition loader
pub mod loader;

/// Scheduled pipeline run
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
