//! Pagination module
//!
//! Page-number pagination with rate-limit backoff.
//!
//! # Overview
//!
//! [`PaginatedCollector`] drives any [`PageFetcher`] from page 1 until a page
//! comes back shorter than the requested limit. Rate-limited requests are
//! retried on the same page with exponential backoff; every other failure
//! ends the collection with whatever was gathered so far.

mod collector;
mod types;

pub use collector::PaginatedCollector;
pub use types::{BackoffPolicy, Collected, Page, PageFetcher, PaginationState, Termination};

#[cfg(test)]
mod tests;
