//! Date-range partition loader

use super::reader::{normalize_record, read_partition_file};
use super::types::LoadStats;
use crate::partition::{accepted_dir_names, DateRange, PartitionStore};
use crate::types::iso_day;
use crate::warehouse::{TableRef, TableSchema, Warehouse};
use tracing::{debug, error, info};

/// Loads partition files into a warehouse table
pub struct PartitionLoader<'a> {
    warehouse: &'a dyn Warehouse,
}

impl<'a> PartitionLoader<'a> {
    /// Create a loader over a warehouse
    pub fn new(warehouse: &'a dyn Warehouse) -> Self {
        Self { warehouse }
    }

    /// Load every day in `range` found under `base` in `store`.
    ///
    /// `base` is relative to the store root and may be empty when the store
    /// is opened directly on a dataset folder.
    pub async fn load(
        &self,
        store: &PartitionStore,
        base: &str,
        table: &TableRef,
        schema: &TableSchema,
        range: DateRange,
    ) -> LoadStats {
        let mut stats = LoadStats::default();
        info!("Loading {range} from {} into {table}", store.display_path(base));

        for day in range.days() {
            stats.days_scanned += 1;

            let mut found = false;
            for dir in accepted_dir_names(day).iter().map(|name| join(base, name)) {
                let files = match store.list_files(&dir).await {
                    Ok(files) => files,
                    Err(e) => {
                        error!("Error listing {}: {e}", store.display_path(&dir));
                        continue;
                    }
                };
                if files.is_empty() {
                    continue;
                }
                found = true;

                for name in files.iter().filter(|name| name.ends_with(".json")) {
                    let relative = format!("{dir}/{name}");
                    self.load_file(store, &relative, table, schema, &mut stats)
                        .await;
                }
            }

            if !found {
                info!(
                    "Partition for {} not found under {}. Skipping.",
                    iso_day(day),
                    store.display_path(base)
                );
                stats.days_skipped += 1;
            }
        }

        info!("Load into {table} finished: {stats}");
        stats
    }

    async fn load_file(
        &self,
        store: &PartitionStore,
        relative: &str,
        table: &TableRef,
        schema: &TableSchema,
        stats: &mut LoadStats,
    ) {
        let source_file = store.display_path(relative);
        let mut records = read_partition_file(store, relative).await;
        stats.files_read += 1;

        if records.is_empty() {
            info!("No records in {source_file}. Skipping.");
            stats.files_empty += 1;
            return;
        }

        for record in &mut records {
            normalize_record(record, &source_file);
        }

        info!(
            "Loading {} records from {source_file} into {table}",
            records.len()
        );
        match self
            .warehouse
            .load(table, schema, &records, &source_file)
            .await
        {
            Ok(job) if job.state.is_succeeded() => {
                let rows = job.rows().unwrap_or_default();
                info!("Loaded {rows} rows into {table} from {source_file}");
                debug!("Load job {} finished", job.id);
                stats.files_loaded += 1;
                stats.rows_loaded += rows;
            }
            Ok(job) => {
                error!(
                    "Errors loading {source_file}: {}",
                    job.errors().join("; ")
                );
                stats.files_failed += 1;
            }
            Err(e) => {
                error!("Error loading {source_file}: {e}");
                stats.files_failed += 1;
            }
        }
    }
}

fn join(base: &str, name: &str) -> String {
    let base = base.trim_matches('/');
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}
