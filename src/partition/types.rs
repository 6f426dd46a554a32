//! Partition types
//!
//! Calendar-day ranges and the `date=` directory naming shared by the
//! writer and the loader.

use crate::error::{Error, Result};
use crate::types::{compact_day, iso_day, parse_day, Dataset};
use chrono::{Duration, NaiveDate};

/// Inclusive range of calendar days, iterated in ascending order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First day
    pub start: NaiveDate,
    /// Last day (inclusive)
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range; `start > end` is allowed and yields no days
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse both ends from `YYYY-MM-DD` or `YYYYMMDD`
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(parse_day(start)?, parse_day(end)?))
    }

    /// The `lookback_days` days before `as_of`, ending the day before it
    pub fn trailing(as_of: NaiveDate, lookback_days: u32) -> Result<Self> {
        if lookback_days == 0 {
            return Err(Error::invalid_value(
                "schedule.lookback_days",
                "must be positive",
            ));
        }
        Ok(Self::new(
            as_of - Duration::days(i64::from(lookback_days)),
            as_of - Duration::days(1),
        ))
    }

    /// Single-day range
    pub fn single(day: NaiveDate) -> Self {
        Self::new(day, day)
    }

    /// Number of days in the range
    pub fn len(&self) -> usize {
        if self.start > self.end {
            0
        } else {
            (self.end - self.start).num_days() as usize + 1
        }
    }

    /// True when the range holds no days
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Iterate the days in ascending order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", iso_day(self.start), iso_day(self.end))
    }
}

/// `date=YYYY-MM-DD`, the name the writer uses
pub fn partition_dir_name(day: NaiveDate) -> String {
    format!("date={}", iso_day(day))
}

/// Both directory names the loader accepts for a day, ISO first
pub fn accepted_dir_names(day: NaiveDate) -> [String; 2] {
    [
        format!("date={}", iso_day(day)),
        format!("date={}", compact_day(day)),
    ]
}

/// Read the day back out of a `date=...` directory name
pub fn parse_partition_dir(name: &str) -> Option<NaiveDate> {
    name.strip_prefix("date=").and_then(|v| parse_day(v).ok())
}

/// Relative directory of a dataset's partition for one day
pub fn partition_prefix(dataset: Dataset, day: NaiveDate) -> String {
    format!("{}/{}", dataset.folder(), partition_dir_name(day))
}
