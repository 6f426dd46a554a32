//! Warehouse types: table references, load jobs and the warehouse seam

use super::schema::{quote_ident, TableSchema};
use crate::error::{Error, Result};
use crate::types::Record;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// ============================================================================
// Table Reference
// ============================================================================

/// Destination table, `project.dataset.table` or `dataset.table`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub project: Option<String>,
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    /// Parse a dotted table id
    pub fn parse(table_id: &str) -> Result<Self> {
        let parts: Vec<&str> = table_id.split('.').collect();
        let (project, dataset, table) = match parts.as_slice() {
            [dataset, table] => (None, *dataset, *table),
            [project, dataset, table] => (Some(*project), *dataset, *table),
            _ => {
                return Err(Error::invalid_table(
                    table_id,
                    "expected dataset.table or project.dataset.table",
                ))
            }
        };

        if let Some(project) = project {
            if project.is_empty()
                || !project
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(Error::invalid_table(table_id, "invalid project name"));
            }
        }
        for (label, name) in [("dataset", dataset), ("table", table)] {
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(Error::invalid_table(
                    table_id,
                    format!("invalid {label} name '{name}'"),
                ));
            }
        }

        Ok(Self {
            project: project.map(str::to_string),
            dataset: dataset.to_string(),
            table: table.to_string(),
        })
    }

    /// `"dataset"."table"` for SQL
    pub fn qualified(&self) -> String {
        format!("{}.{}", quote_ident(&self.dataset), quote_ident(&self.table))
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.project {
            Some(project) => write!(f, "{project}.{}.{}", self.dataset, self.table),
            None => write!(f, "{}.{}", self.dataset, self.table),
        }
    }
}

// ============================================================================
// Load Job
// ============================================================================

/// State of a load job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Created, not yet submitted
    Pending,
    /// Submitted to the warehouse
    Running,
    /// Rows were appended
    Succeeded { rows: u64 },
    /// Rejected by the warehouse
    Failed { errors: Vec<String> },
}

impl JobState {
    /// Check if the job is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }

    /// Check if the job succeeded
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Check if the job failed
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Short name for logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Append of one partition file's records into one table
#[derive(Debug, Clone)]
pub struct LoadJob {
    pub id: String,
    pub table: TableRef,
    /// Partition file the rows came from
    pub source_file: String,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl LoadJob {
    /// Create a pending job
    pub fn new(table: TableRef, source_file: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            table,
            source_file: source_file.into(),
            state: JobState::Pending,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Pending -> Running
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            JobState::Pending => {
                self.state = JobState::Running;
                Ok(())
            }
            _ => Err(self.transition_error("running")),
        }
    }

    /// Running -> Succeeded
    pub fn succeed(&mut self, rows: u64) -> Result<()> {
        match self.state {
            JobState::Running => {
                self.finish(JobState::Succeeded { rows });
                Ok(())
            }
            _ => Err(self.transition_error("succeeded")),
        }
    }

    /// Pending or Running -> Failed
    pub fn fail(&mut self, errors: Vec<String>) -> Result<()> {
        match self.state {
            JobState::Pending | JobState::Running => {
                self.finish(JobState::Failed { errors });
                Ok(())
            }
            _ => Err(self.transition_error("failed")),
        }
    }

    fn finish(&mut self, state: JobState) {
        self.state = state;
        self.finished_at = Some(Utc::now());
    }

    fn transition_error(&self, to: &'static str) -> Error {
        Error::JobTransition {
            job_id: self.id.clone(),
            from: self.state.name(),
            to,
        }
    }

    /// Rows appended, once succeeded
    pub fn rows(&self) -> Option<u64> {
        match self.state {
            JobState::Succeeded { rows } => Some(rows),
            _ => None,
        }
    }

    /// Errors reported by the warehouse, empty unless failed
    pub fn errors(&self) -> &[String] {
        match &self.state {
            JobState::Failed { errors } => errors,
            _ => &[],
        }
    }
}

// ============================================================================
// Warehouse Trait
// ============================================================================

/// Columnar warehouse accepting append-only load jobs
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Append `rows` to `table`, creating it from `schema` if needed.
    ///
    /// Returns once the job is terminal. Rejected loads come back as a
    /// failed job; `Err` is reserved for problems with the request itself.
    async fn load(
        &self,
        table: &TableRef,
        schema: &TableSchema,
        rows: &[Record],
        source_file: &str,
    ) -> Result<LoadJob>;
}
