//! Extraction types

use crate::config::DatasetConfig;
use serde::Serialize;

/// Optional narrowing filters for session requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFilters {
    pub country: Option<String>,
    pub device_category: Option<String>,
}

impl SessionFilters {
    /// Filters configured for a dataset
    pub fn from_config(config: &DatasetConfig) -> Self {
        Self {
            country: config.country.clone(),
            device_category: config.device_category.clone(),
        }
    }
}

/// Counters for one extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractStats {
    /// Days visited
    pub days: usize,
    /// Days that returned no records
    pub empty_days: usize,
    /// Days whose collection stopped early (request failure or retries exhausted)
    pub incomplete_days: usize,
    /// Partition files written
    pub files_written: usize,
    /// Days whose records could not be written
    pub write_failures: usize,
    /// Records collected across all days
    pub records: usize,
    /// API requests issued
    pub requests: u32,
}

impl std::fmt::Display for ExtractStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} days ({} empty, {} incomplete), {} records, {} files written, {} write failures, {} requests",
            self.days,
            self.empty_days,
            self.incomplete_days,
            self.records,
            self.files_written,
            self.write_failures,
            self.requests
        )
    }
}
