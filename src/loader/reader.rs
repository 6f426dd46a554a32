//! Partition file reading and row normalization

use crate::error::{Error, Result};
use crate::partition::PartitionStore;
use crate::types::{is_compact_digits, iso_day, JsonValue, Record, COMPACT_DAY_FORMAT};
use chrono::NaiveDate;
use tracing::error;

/// Column added to every loaded row
pub const SOURCE_FILE_COLUMN: &str = "source_file";

/// Field rewritten from `YYYYMMDD` to `YYYY-MM-DD`
pub const DATE_FIELD: &str = "date";

/// Parse a partition file: a JSON array of objects, or a single object
pub fn parse_partition_file(bytes: &[u8]) -> Result<Vec<Record>> {
    match serde_json::from_slice::<JsonValue>(bytes)? {
        JsonValue::Object(record) => Ok(vec![record]),
        JsonValue::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                JsonValue::Object(record) => Ok(record),
                other => Err(Error::decode(format!(
                    "element {i} is {}, expected an object",
                    json_kind(&other)
                ))),
            })
            .collect(),
        other => Err(Error::decode(format!(
            "top level is {}, expected an array or object",
            json_kind(&other)
        ))),
    }
}

/// Read a partition file; failures are logged and yield no records
pub async fn read_partition_file(store: &PartitionStore, relative: &str) -> Vec<Record> {
    let bytes = match store.get(relative).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Error reading {}: {e}", store.display_path(relative));
            return Vec::new();
        }
    };

    match parse_partition_file(&bytes) {
        Ok(records) => records,
        Err(e) => {
            error!("Error reading {}: {e}", store.display_path(relative));
            Vec::new()
        }
    }
}

/// Tag a row with its file and rewrite a compact `date` to ISO form.
///
/// Anything other than eight digits forming a real day is left untouched.
pub fn normalize_record(record: &mut Record, source_file: &str) {
    record.insert(
        SOURCE_FILE_COLUMN.to_string(),
        JsonValue::String(source_file.to_string()),
    );

    let iso = match record.get(DATE_FIELD) {
        Some(JsonValue::String(value)) if is_compact_digits(value) => {
            NaiveDate::parse_from_str(value, COMPACT_DAY_FORMAT)
                .ok()
                .map(iso_day)
        }
        _ => None,
    };
    if let Some(iso) = iso {
        record.insert(DATE_FIELD.to_string(), JsonValue::String(iso));
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
