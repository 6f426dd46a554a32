//! Loader types

use serde::Serialize;

/// Counters for one load run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Days visited in the range
    pub days_scanned: usize,
    /// Days with no partition directory
    pub days_skipped: usize,
    /// `.json` files opened
    pub files_read: usize,
    /// Files that produced no records (unreadable, malformed or empty)
    pub files_empty: usize,
    /// Files whose load job succeeded
    pub files_loaded: usize,
    /// Files whose load job failed or could not be submitted
    pub files_failed: usize,
    /// Rows accepted by the warehouse
    pub rows_loaded: u64,
}

impl LoadStats {
    /// True when no file failed to load
    pub fn is_clean(&self) -> bool {
        self.files_failed == 0
    }
}

impl std::fmt::Display for LoadStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} days scanned ({} skipped), {} files read, {} loaded, {} failed, {} rows",
            self.days_scanned,
            self.days_skipped,
            self.files_read,
            self.files_loaded,
            self.files_failed,
            self.rows_loaded
        )
    }
}
