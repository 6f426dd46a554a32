//! Pipeline runner

use super::types::{RunReport, Step, StepOutcome, StepPolicy, StepReport};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::extract::{Extractor, SessionFilters};
use crate::http::{ApiClient, HttpClientConfig};
use crate::loader::PartitionLoader;
use crate::pagination::{BackoffPolicy, PaginatedCollector};
use crate::partition::{DateRange, PartitionStore, PartitionWriter};
use crate::warehouse::{DuckDbWarehouse, TableRef, TableSchema, Warehouse};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Everything a run needs, built once
pub struct Pipeline {
    config: PipelineConfig,
    client: ApiClient,
    store: PartitionStore,
    warehouse: Arc<dyn Warehouse>,
    policy: StepPolicy,
}

impl Pipeline {
    /// Assemble a pipeline from parts
    pub fn new(
        config: PipelineConfig,
        client: ApiClient,
        store: PartitionStore,
        warehouse: Arc<dyn Warehouse>,
    ) -> Self {
        let policy = StepPolicy::from_config(&config.schedule);
        Self {
            config,
            client,
            store,
            warehouse,
            policy,
        }
    }

    /// Open the API client, partition store and warehouse named by `config`
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        config.validate_for_extract()?;
        let client = ApiClient::new(HttpClientConfig::from_api_config(&config.api))?;
        let store = PartitionStore::create(&config.storage.data_dir)?;
        let warehouse =
            DuckDbWarehouse::open_for_project(&config.warehouse.dir, &config.warehouse.project)?;
        Ok(Self::new(config, client, store, Arc::new(warehouse)))
    }

    /// Override the step policy
    #[must_use]
    pub fn with_policy(mut self, policy: StepPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Day window for a run on `as_of`
    pub fn window(&self, as_of: NaiveDate) -> Result<DateRange> {
        DateRange::trailing(as_of, self.config.schedule.lookback_days)
    }

    /// Run all four steps for the window ending the day before `as_of`
    pub async fn run(&self, as_of: NaiveDate) -> Result<RunReport> {
        let range = self.window(as_of)?;
        info!("Pipeline run for {range}");

        let mut steps = Vec::with_capacity(Step::RUN_ORDER.len());
        for step in Step::RUN_ORDER {
            let report = self.run_step(step, range).await?;
            steps.push(report);
        }

        info!("Pipeline run for {range} finished");
        Ok(RunReport { range, steps })
    }

    /// Run one step under the policy's timeout and retries
    pub async fn run_step(&self, step: Step, range: DateRange) -> Result<StepReport> {
        let max_attempts = self.policy.max_attempts();
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            info!("Starting {step} (attempt {attempt}/{max_attempts})");
            let started = Instant::now();

            match tokio::time::timeout(self.policy.timeout, self.execute(step, range)).await {
                Ok(Ok(outcome)) => {
                    let duration = started.elapsed();
                    info!("{step} finished in {:.1}s", duration.as_secs_f64());
                    return Ok(StepReport {
                        step,
                        attempts: attempt,
                        outcome,
                        duration,
                    });
                }
                Ok(Err(e)) => {
                    error!("{step} failed: {e}");
                    last_error = e.to_string();
                }
                Err(_) => {
                    let e = Error::StepTimeout {
                        step: step.name(),
                        timeout_secs: self.policy.timeout.as_secs(),
                    };
                    error!("{e}");
                    last_error = e.to_string();
                }
            }

            if attempt < max_attempts {
                warn!(
                    "Retrying {step} in {}s",
                    self.policy.retry_delay.as_secs_f64()
                );
                tokio::time::sleep(self.policy.retry_delay).await;
            }
        }

        Err(Error::StepFailed {
            step: step.name(),
            attempts: max_attempts,
            message: last_error,
        })
    }

    async fn execute(&self, step: Step, range: DateRange) -> Result<StepOutcome> {
        match step {
            Step::Extract(dataset) => {
                let settings = self.config.datasets.get(dataset);
                let extractor = Extractor::new(
                    PaginatedCollector::new(BackoffPolicy::from_config(&self.config.backoff)),
                    PartitionWriter::new(self.store.clone()),
                )
                .with_session_filters(SessionFilters::from_config(settings));

                let stats = extractor
                    .extract(&self.client, dataset, range, settings.limit)
                    .await;
                Ok(StepOutcome::Extracted(stats))
            }
            Step::Load(dataset) => {
                let table = TableRef::parse(self.config.table_for(dataset))?;
                let schema = TableSchema::for_dataset(dataset);

                let stats = PartitionLoader::new(self.warehouse.as_ref())
                    .load(&self.store, dataset.folder(), &table, &schema, range)
                    .await;
                Ok(StepOutcome::Loaded(stats))
            }
        }
    }
}
