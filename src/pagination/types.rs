//! Pagination types and traits
//!
//! Defines the page model, the fetcher seam and the collector's bookkeeping.

use crate::config::BackoffConfig;
use crate::error::{Error, Result};
use crate::types::{QueryFilters, Record};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// One bounded batch of records returned by a single API call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Records in response order
    pub records: Vec<Record>,
    /// The API's own pagination block, kept for logging only
    pub pagination: Option<Value>,
}

impl Page {
    /// Create a page from records
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            pagination: None,
        }
    }

    /// Decode a response body of the form `{"records": [...], "pagination": {...}}`.
    ///
    /// A body without `records` (or with `records: null`) is an empty page.
    pub fn from_body(body: Value) -> Result<Self> {
        let Value::Object(mut body) = body else {
            return Err(Error::decode("response body is not a JSON object"));
        };

        let pagination = body.remove("pagination");
        let records = match body.remove("records") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| match item {
                    Value::Object(record) => Ok(record),
                    other => Err(Error::decode(format!(
                        "record {idx} is not an object: {other}"
                    ))),
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(Error::decode(format!(
                    "'records' is not an array: {other}"
                )))
            }
        };

        Ok(Self {
            records,
            pagination,
        })
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the page holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Source of pages for the collector
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `page` (1-based) holding at most `limit` records
    async fn fetch(&self, page: u32, limit: u32, filters: &QueryFilters) -> Result<Page>;
}

/// Exponential backoff applied to rate-limited requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// First wait
    pub initial: Duration,
    /// Upper bound for a single wait
    pub max: Duration,
    /// Retries allowed for one page before giving up
    pub max_retries: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(2),
            max: Duration::from_secs(60),
            max_retries: 5,
        }
    }
}

impl BackoffPolicy {
    /// Create a policy
    pub fn new(initial: Duration, max: Duration, max_retries: u32) -> Self {
        Self {
            initial,
            max,
            max_retries,
        }
    }

    /// Build from the `backoff` config section
    pub fn from_config(config: &BackoffConfig) -> Self {
        Self::new(
            Duration::from_secs(config.initial_secs),
            Duration::from_secs(config.max_secs),
            config.max_retries,
        )
    }

    /// Wait before the retry that follows `retry_count` earlier retries:
    /// `min(initial * 2^retry_count, max)`
    pub fn delay(&self, retry_count: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry_count);
        let delay = self.initial.checked_mul(factor).unwrap_or(self.max);
        std::cmp::min(delay, self.max)
    }
}

/// Why a collection stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A page came back empty
    EndOfData,
    /// A page came back with fewer records than requested
    LastPage,
    /// A fetch failed with a non-retryable error
    Failed,
    /// Rate limiting outlasted the retry ceiling
    RetriesExhausted,
}

impl Termination {
    /// True when the API signalled the end of the data
    pub fn is_complete(self) -> bool {
        matches!(self, Termination::EndOfData | Termination::LastPage)
    }
}

/// Records gathered by one collection, with its bookkeeping
#[derive(Debug, Clone)]
pub struct Collected {
    /// Every record accepted, in page order
    pub records: Vec<Record>,
    /// Requests issued, including rate-limited ones
    pub requests: u32,
    /// Pages that returned records
    pub pages: u32,
    /// Rate-limit retries performed
    pub retries: u32,
    /// Why collection stopped
    pub termination: Termination,
}

impl Collected {
    /// True when collection reached the end of the data
    pub fn is_complete(&self) -> bool {
        self.termination.is_complete()
    }
}

/// Mutable cursor for one collection call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    /// Page to request next (1-based)
    pub page: u32,
    /// Consecutive rate-limit retries on the current page
    pub retry_count: u32,
    /// Requests issued so far
    pub requests: u32,
    /// Rate-limit retries over the whole collection
    pub total_retries: u32,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationState {
    /// State positioned on page 1
    pub fn new() -> Self {
        Self {
            page: 1,
            retry_count: 0,
            requests: 0,
            total_retries: 0,
        }
    }

    /// Move to the next page and clear the retry counter
    pub fn next_page(&mut self) {
        self.page += 1;
        self.retry_count = 0;
    }

    /// Record a rate-limit retry on the current page
    pub fn add_retry(&mut self) {
        self.retry_count += 1;
        self.total_retries += 1;
    }
}
