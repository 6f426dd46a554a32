//! Partition file writer
//!
//! Writes one day's records as a pretty-printed JSON array under
//! `<dataset>/date=YYYY-MM-DD/part-xxxxxxxx.json`. Names are random, so a
//! second run for the same day adds a file instead of replacing one.

use super::store::PartitionStore;
use super::types::partition_prefix;
use crate::error::{Error, Result};
use crate::types::{iso_day, Dataset, Record};
use bytes::Bytes;
use chrono::NaiveDate;
use tracing::{info, warn};

/// Writes partition files into a [`PartitionStore`]
#[derive(Debug, Clone)]
pub struct PartitionWriter {
    store: PartitionStore,
}

impl PartitionWriter {
    /// Create a writer over a store
    pub fn new(store: PartitionStore) -> Self {
        Self { store }
    }

    /// Underlying store
    pub fn store(&self) -> &PartitionStore {
        &self.store
    }

    /// Write a day's records; empty input writes nothing and returns `None`
    pub async fn write(
        &self,
        records: &[Record],
        dataset: Dataset,
        day: NaiveDate,
    ) -> Result<Option<String>> {
        if records.is_empty() {
            warn!("No data to save for {dataset} ({}).", iso_day(day));
            return Ok(None);
        }

        let relative = format!("{}/{}", partition_prefix(dataset, day), part_file_name());
        let body = serde_json::to_vec_pretty(records)
            .map_err(|e| Error::Other(format!("Failed to serialize {dataset} records: {e}")))?;

        let path = self.store.put(&relative, Bytes::from(body)).await?;
        info!("Saved {} records to {path}", records.len());
        Ok(Some(path))
    }
}

/// `part-` plus the first 8 hex digits of a v4 UUID
pub fn part_file_name() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("part-{}.json", &id[..8])
}
