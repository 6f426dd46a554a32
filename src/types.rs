//! Common types used throughout the pipeline
//!
//! Shared type aliases, the dataset enumeration and calendar-day helpers.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// A single API record: an opaque JSON object
pub type Record = serde_json::Map<String, JsonValue>;

/// Ordered query filters sent alongside `page` and `limit`
pub type QueryFilters = Vec<(String, String)>;

// ============================================================================
// Day formats
// ============================================================================

/// Hyphenated ISO day, `2016-08-01`
pub const ISO_DAY_FORMAT: &str = "%Y-%m-%d";

/// Compact day, `20160801`
pub const COMPACT_DAY_FORMAT: &str = "%Y%m%d";

/// Format a day as `YYYY-MM-DD`
pub fn iso_day(day: NaiveDate) -> String {
    day.format(ISO_DAY_FORMAT).to_string()
}

/// Format a day as `YYYYMMDD`
pub fn compact_day(day: NaiveDate) -> String {
    day.format(COMPACT_DAY_FORMAT).to_string()
}

/// Parse a day given as `YYYY-MM-DD` or `YYYYMMDD`
pub fn parse_day(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    let parsed = if is_compact_digits(value) {
        NaiveDate::parse_from_str(value, COMPACT_DAY_FORMAT)
    } else {
        NaiveDate::parse_from_str(value, ISO_DAY_FORMAT)
    };
    parsed.map_err(|_| Error::invalid_value("date", format!("'{value}' is not a valid day")))
}

/// Exactly eight ASCII digits, the shape of a compact day
pub fn is_compact_digits(value: &str) -> bool {
    value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit())
}

// ============================================================================
// Dataset
// ============================================================================

/// The two datasets served by the analytics API
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    /// Flat daily visit totals
    DailyVisits,
    /// Nested Google-Analytics-style session records
    GaSessions,
}

impl Dataset {
    /// All datasets, in pipeline order
    pub const ALL: [Dataset; 2] = [Dataset::DailyVisits, Dataset::GaSessions];

    /// API resource path
    pub fn endpoint(self) -> &'static str {
        match self {
            Dataset::DailyVisits => "daily-visits",
            Dataset::GaSessions => "ga-sessions-data",
        }
    }

    /// Top-level folder for this dataset's partitions
    pub fn folder(self) -> &'static str {
        match self {
            Dataset::DailyVisits => "daily_visits",
            Dataset::GaSessions => "ga_sessions",
        }
    }

    /// Table name used when none is configured
    pub fn default_table(self) -> &'static str {
        match self {
            Dataset::DailyVisits => "analytics.daily_visits",
            Dataset::GaSessions => "analytics.ga_sessions",
        }
    }

    /// Human-readable name for logs
    pub fn label(self) -> &'static str {
        match self {
            Dataset::DailyVisits => "Daily Visits",
            Dataset::GaSessions => "GA Sessions",
        }
    }

    /// Guess the dataset behind a table id.
    ///
    /// Only used at the CLI boundary when `--dataset` is not given; anything
    /// that does not mention `ga_sessions` is treated as daily visits.
    pub fn infer_from_table_id(table_id: &str) -> Self {
        if table_id.to_lowercase().contains("ga_sessions") {
            Dataset::GaSessions
        } else {
            Dataset::DailyVisits
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.folder())
    }
}
