//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::extract::{Extractor, SessionFilters};
use crate::http::{ApiClient, HttpClientConfig};
use crate::loader::PartitionLoader;
use crate::pagination::{BackoffPolicy, PaginatedCollector};
use crate::partition::{DateRange, PartitionStore, PartitionWriter};
use crate::pipeline::{Pipeline, StepOutcome};
use crate::types::{iso_day, Dataset};
use crate::warehouse::{DuckDbWarehouse, TableRef, TableSchema};
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Extract {
                dataset,
                start,
                end,
                limit,
                data_dir,
            } => {
                self.extract(
                    *dataset,
                    DateRange::new(*start, *end),
                    *limit,
                    data_dir.as_deref(),
                )
                .await
            }
            Commands::Load {
                dataset,
                path,
                project,
                table,
                start,
                end,
            } => {
                self.load(
                    *dataset,
                    path,
                    project.as_deref(),
                    table.as_deref(),
                    DateRange::new(*start, *end),
                )
                .await
            }
            Commands::Run { as_of } => self.run_pipeline(*as_of).await,
        }
    }

    /// Configuration from `--config`, or defaults plus environment
    fn load_config(&self) -> Result<PipelineConfig> {
        match &self.cli.config {
            Some(path) => PipelineConfig::from_file(path),
            None => Ok(PipelineConfig::from_env()),
        }
    }

    /// Extract one dataset into partitions
    async fn extract(
        &self,
        dataset: Dataset,
        range: DateRange,
        limit: Option<u32>,
        data_dir: Option<&str>,
    ) -> Result<()> {
        let mut config = self.load_config()?;
        if let Some(dir) = data_dir {
            config.storage.data_dir = dir.to_string();
        }
        if let Some(limit) = limit {
            if limit == 0 {
                return Err(Error::invalid_value("--limit", "must be positive"));
            }
            match dataset {
                Dataset::DailyVisits => config.datasets.daily_visits.limit = limit,
                Dataset::GaSessions => config.datasets.ga_sessions.limit = limit,
            }
        }
        config.validate_for_extract()?;

        let settings = config.datasets.get(dataset);
        let client = ApiClient::new(HttpClientConfig::from_api_config(&config.api))?;
        let store = PartitionStore::create(&config.storage.data_dir)?;
        let extractor = Extractor::new(
            PaginatedCollector::new(BackoffPolicy::from_config(&config.backoff)),
            PartitionWriter::new(store),
        )
        .with_session_filters(SessionFilters::from_config(settings));

        let stats = extractor
            .extract(&client, dataset, range, settings.limit)
            .await;

        self.output_message(&json!({
            "type": "EXTRACT_STATS",
            "dataset": dataset.folder(),
            "start": iso_day(range.start),
            "end": iso_day(range.end),
            "stats": stats,
        }));
        Ok(())
    }

    /// Load one dataset folder into a table
    async fn load(
        &self,
        dataset: Option<Dataset>,
        path: &str,
        project: Option<&str>,
        table: Option<&str>,
        range: DateRange,
    ) -> Result<()> {
        let config = self.load_config()?;
        let dataset = resolve_dataset(dataset, table);
        let table_id = table.unwrap_or_else(|| config.table_for(dataset));
        let project = project.unwrap_or(config.warehouse.project.as_str());

        let table = TableRef::parse(table_id)?;
        if let Some(table_project) = &table.project {
            if table_project != project {
                return Err(Error::invalid_table(
                    table_id,
                    format!("does not belong to project '{project}'"),
                ));
            }
        }

        let warehouse = DuckDbWarehouse::open_for_project(&config.warehouse.dir, project)?;
        let store = PartitionStore::open(path)?;
        let schema = TableSchema::for_dataset(dataset);

        let stats = PartitionLoader::new(&warehouse)
            .load(&store, "", &table, &schema, range)
            .await;

        self.output_message(&json!({
            "type": "LOAD_STATS",
            "dataset": dataset.folder(),
            "table": table.to_string(),
            "start": iso_day(range.start),
            "end": iso_day(range.end),
            "stats": stats,
        }));
        Ok(())
    }

    /// Run the four-step pipeline
    async fn run_pipeline(&self, as_of: Option<NaiveDate>) -> Result<()> {
        let config = self.load_config()?;
        let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
        let pipeline = Pipeline::from_config(config)?;

        let report = pipeline.run(as_of).await?;

        let steps: Vec<Value> = report
            .steps
            .iter()
            .map(|s| {
                let outcome = match &s.outcome {
                    StepOutcome::Extracted(stats) => json!({ "extracted": stats }),
                    StepOutcome::Loaded(stats) => json!({ "loaded": stats }),
                };
                json!({
                    "step": s.step.name(),
                    "attempts": s.attempts,
                    "duration_ms": s.duration.as_millis() as u64,
                    "outcome": outcome,
                })
            })
            .collect();

        self.output_message(&json!({
            "type": "RUN_REPORT",
            "start": iso_day(report.range.start),
            "end": iso_day(report.range.end),
            "steps": steps,
        }));
        Ok(())
    }

    /// Output a message in the configured format
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Explicit `--dataset`, otherwise a guess from the table name
pub fn resolve_dataset(dataset: Option<Dataset>, table: Option<&str>) -> Dataset {
    match (dataset, table) {
        (Some(dataset), _) => dataset,
        (None, Some(table)) => {
            let dataset = Dataset::infer_from_table_id(table);
            info!("No --dataset given, using {dataset} for table {table}");
            dataset
        }
        (None, None) => Dataset::DailyVisits,
    }
}
