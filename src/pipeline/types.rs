//! Pipeline types

use crate::config::ScheduleConfig;
use crate::extract::ExtractStats;
use crate::loader::LoadStats;
use crate::partition::DateRange;
use crate::types::Dataset;
use std::time::Duration;

/// Timeout and retry policy for pipeline steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPolicy {
    /// Limit on a single attempt
    pub timeout: Duration,
    /// Attempts after the first
    pub retries: u32,
    /// Wait before each retry
    pub retry_delay: Duration,
}

impl Default for StepPolicy {
    fn default() -> Self {
        Self::from_config(&ScheduleConfig::default())
    }
}

impl StepPolicy {
    /// Create a policy
    pub fn new(timeout: Duration, retries: u32, retry_delay: Duration) -> Self {
        Self {
            timeout,
            retries,
            retry_delay,
        }
    }

    /// Policy from the schedule section
    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(
            Duration::from_secs(config.step_timeout_secs),
            config.step_retries,
            Duration::from_secs(config.retry_delay_secs),
        )
    }

    /// Total attempts allowed
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

/// One unit of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Pull a dataset from the API into partitions
    Extract(Dataset),
    /// Load a dataset's partitions into its table
    Load(Dataset),
}

impl Step {
    /// Steps of a full run, in order
    pub const RUN_ORDER: [Step; 4] = [
        Step::Extract(Dataset::DailyVisits),
        Step::Load(Dataset::DailyVisits),
        Step::Extract(Dataset::GaSessions),
        Step::Load(Dataset::GaSessions),
    ];

    /// Step name for logs, e.g. `extract_daily_visits`
    pub fn name(self) -> String {
        match self {
            Step::Extract(dataset) => format!("extract_{}", dataset.folder()),
            Step::Load(dataset) => format!("load_{}", dataset.folder()),
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

/// What a successful step did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Extracted(ExtractStats),
    Loaded(LoadStats),
}

/// Result of one step
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: Step,
    /// Attempts used, including the successful one
    pub attempts: u32,
    pub outcome: StepOutcome,
    pub duration: Duration,
}

/// Result of a full run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Day window covered
    pub range: DateRange,
    /// Completed steps, in order
    pub steps: Vec<StepReport>,
}
