//! Date-range extraction module
//!
//! Runs the paginated collector once per calendar day and writes each
//! non-empty day to its own partition.

mod extractor;
mod types;

pub use extractor::{day_filters, Extractor};
pub use types::{ExtractStats, SessionFilters};
