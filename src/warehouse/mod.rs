//! Warehouse module
//!
//! Table schemas, the load-job state machine and an embedded DuckDB
//! implementation of the [`Warehouse`] seam.
//!
//! # Example
//!
//! ```rust,ignore
//! let warehouse = DuckDbWarehouse::open_for_project("warehouse", "my-project")?;
//! let table = TableRef::parse("my-project.analytics.daily_visits")?;
//! let job = warehouse
//!     .load(&table, &TableSchema::daily_visits(), &rows, "data/daily_visits/date=2016-08-01/part-1a2b3c4d.json")
//!     .await?;
//! ```

mod embedded;
mod schema;
mod types;

pub use embedded::DuckDbWarehouse;
pub use schema::{quote_ident, quote_literal, Field, FieldMode, FieldType, TableSchema};
pub use types::{JobState, LoadJob, TableRef, Warehouse};

#[cfg(test)]
mod tests;
