//! Pipeline configuration
//!
//! Configuration is read from an optional YAML file. Every section has
//! defaults, so an empty file (or no file) yields a usable config once the
//! API key is supplied, usually through `ANALYTICS_API_KEY`.

use crate::error::{Error, Result};
use crate::types::Dataset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the API key
pub const ENV_API_KEY: &str = "ANALYTICS_API_KEY";
/// Environment variable overriding the API base URL
pub const ENV_BASE_URL: &str = "ANALYTICS_API_BASE_URL";
/// Environment variable overriding the partition root
pub const ENV_DATA_DIR: &str = "ANALYTICS_DATA_DIR";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// API gateway settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Rate-limit backoff settings
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Partition storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Warehouse settings
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    /// Per-dataset extraction settings
    #[serde(default)]
    pub datasets: DatasetsConfig,

    /// Pipeline step policy
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl PipelineConfig {
    /// Load from a YAML file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        let mut config = Self::from_yaml(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Parse from a YAML string (no environment overrides)
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Apply `ANALYTICS_*` environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(ENV_API_KEY) {
            if !key.is_empty() {
                self.api.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            if !url.is_empty() {
                self.api.base_url = url;
            }
        }
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            if !dir.is_empty() {
                self.storage.data_dir = dir;
            }
        }
    }

    /// Checks needed before any extraction
    pub fn validate_for_extract(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(Error::missing_field("api.base_url"));
        }
        url::Url::parse(&self.api.base_url)?;
        if self.api.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(Error::missing_field(format!(
                "api.api_key (or set {ENV_API_KEY})"
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(Error::invalid_value("api.timeout_secs", "must be positive"));
        }
        for dataset in Dataset::ALL {
            if self.datasets.get(dataset).limit == 0 {
                return Err(Error::invalid_value(
                    format!("datasets.{dataset}.limit"),
                    "must be positive",
                ));
            }
        }
        Ok(())
    }

    /// Configured table id for a dataset
    pub fn table_for(&self, dataset: Dataset) -> &str {
        match dataset {
            Dataset::DailyVisits => &self.warehouse.daily_visits_table,
            Dataset::GaSessions => &self.warehouse.ga_sessions_table,
        }
    }
}

// ============================================================================
// API
// ============================================================================

/// API gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the gateway
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Key sent in the `X-API-Key` header
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Client-side pacing; unset means no pacing
    #[serde(default)]
    pub requests_per_second: Option<u32>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            requests_per_second: None,
        }
    }
}

impl ApiConfig {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "https://dish-second-course-gateway-2tximoqc.nw.gateway.dev".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

// ============================================================================
// Backoff
// ============================================================================

/// Rate-limit backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// First wait, in seconds
    #[serde(default = "default_initial_backoff")]
    pub initial_secs: u64,

    /// Upper bound for any single wait, in seconds
    #[serde(default = "default_max_backoff")]
    pub max_secs: u64,

    /// Rate-limit retries allowed for one page
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_secs: default_initial_backoff(),
            max_secs: default_max_backoff(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_initial_backoff() -> u64 {
    2
}

fn default_max_backoff() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    5
}

// ============================================================================
// Storage
// ============================================================================

/// Partition storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root for partitions: a local path or `s3://`, `gs://`, `az://` URL
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

// ============================================================================
// Warehouse
// ============================================================================

/// Warehouse configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Directory holding one database file per project
    #[serde(default = "default_warehouse_dir")]
    pub dir: PathBuf,

    /// Project id
    #[serde(default = "default_project")]
    pub project: String,

    /// Destination for daily visits
    #[serde(default = "default_daily_visits_table")]
    pub daily_visits_table: String,

    /// Destination for GA sessions
    #[serde(default = "default_ga_sessions_table")]
    pub ga_sessions_table: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            dir: default_warehouse_dir(),
            project: default_project(),
            daily_visits_table: default_daily_visits_table(),
            ga_sessions_table: default_ga_sessions_table(),
        }
    }
}

fn default_warehouse_dir() -> PathBuf {
    PathBuf::from("warehouse")
}

fn default_project() -> String {
    "dish-second-course".to_string()
}

fn default_daily_visits_table() -> String {
    format!("{}.{}", default_project(), Dataset::DailyVisits.default_table())
}

fn default_ga_sessions_table() -> String {
    format!("{}.{}", default_project(), Dataset::GaSessions.default_table())
}

// ============================================================================
// Datasets
// ============================================================================

/// Extraction settings for both datasets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetsConfig {
    /// Daily visits
    #[serde(default = "default_daily_visits")]
    pub daily_visits: DatasetConfig,

    /// GA sessions
    #[serde(default = "default_ga_sessions")]
    pub ga_sessions: DatasetConfig,
}

impl Default for DatasetsConfig {
    fn default() -> Self {
        Self {
            daily_visits: default_daily_visits(),
            ga_sessions: default_ga_sessions(),
        }
    }
}

impl DatasetsConfig {
    /// Settings for one dataset
    pub fn get(&self, dataset: Dataset) -> &DatasetConfig {
        match dataset {
            Dataset::DailyVisits => &self.daily_visits,
            Dataset::GaSessions => &self.ga_sessions,
        }
    }
}

/// Extraction settings for one dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Records requested per page
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// `country` filter (GA sessions only)
    #[serde(default)]
    pub country: Option<String>,

    /// `device_category` filter (GA sessions only)
    #[serde(default)]
    pub device_category: Option<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            country: None,
            device_category: None,
        }
    }
}

fn default_limit() -> u32 {
    50
}

fn default_daily_visits() -> DatasetConfig {
    DatasetConfig::default()
}

fn default_ga_sessions() -> DatasetConfig {
    DatasetConfig {
        limit: 500,
        ..DatasetConfig::default()
    }
}

// ============================================================================
// Schedule
// ============================================================================

/// Step policy for a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Timeout for each step, in seconds
    #[serde(default = "default_step_timeout")]
    pub step_timeout_secs: u64,

    /// Retries after a failed step
    #[serde(default = "default_step_retries")]
    pub step_retries: u32,

    /// Wait between step attempts, in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Days back from the run date where the window starts
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            step_timeout_secs: default_step_timeout(),
            step_retries: default_step_retries(),
            retry_delay_secs: default_retry_delay(),
            lookback_days: default_lookback_days(),
        }
    }
}

fn default_step_timeout() -> u64 {
    180
}

fn default_step_retries() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    300
}

fn default_lookback_days() -> u32 {
    7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.backoff.initial_secs, 2);
        assert_eq!(config.backoff.max_secs, 60);
        assert_eq!(config.backoff.max_retries, 5);
        assert_eq!(config.storage.data_dir, "data");
        assert_eq!(config.datasets.daily_visits.limit, 50);
        assert_eq!(config.datasets.ga_sessions.limit, 500);
        assert_eq!(config.schedule.step_timeout_secs, 180);
        assert_eq!(config.schedule.step_retries, 2);
        assert_eq!(
            config.table_for(Dataset::GaSessions),
            "dish-second-course.analytics.ga_sessions"
        );
    }

    #[test]
    fn test_from_yaml_partial() {
        let yaml = r"
api:
  base_url: http://localhost:9000
  api_key: secret
datasets:
  ga_sessions:
    limit: 25
    country: United States
warehouse:
  project: local
";
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:9000");
        assert_eq!(config.api.api_key.as_deref(), Some("secret"));
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.datasets.ga_sessions.limit, 25);
        assert_eq!(
            config.datasets.ga_sessions.country.as_deref(),
            Some("United States")
        );
        assert_eq!(config.datasets.daily_visits.limit, 50);
        assert_eq!(config.warehouse.project, "local");
        config.validate_for_extract().unwrap();
    }

    #[test]
    fn test_from_yaml_empty() {
        let config = PipelineConfig::from_yaml("").unwrap();
        assert_eq!(config.storage.data_dir, "data");
    }

    #[test]
    fn test_from_yaml_invalid() {
        assert!(matches!(
            PipelineConfig::from_yaml("api: [1, 2"),
            Err(Error::YamlParse(_))
        ));
    }

    #[test]
    fn test_validate_requires_api_key() {
        let config = PipelineConfig::default();
        let err = config.validate_for_extract().unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { .. }));
    }

    #[test]
    fn test_validate_rejects_zero_limit() {
        let mut config = PipelineConfig::default();
        config.api.api_key = Some("k".into());
        config.datasets.daily_visits.limit = 0;
        let err = config.validate_for_extract().unwrap_err();
        assert!(err.to_string().contains("datasets.daily_visits.limit"));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = PipelineConfig::default();
        config.api.api_key = Some("k".into());
        config.api.base_url = "not a url".into();
        assert!(matches!(
            config.validate_for_extract(),
            Err(Error::InvalidUrl(_))
        ));
    }
}
