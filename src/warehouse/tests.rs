//! Tests for warehouse module

use super::*;
use crate::error::Error;
use crate::types::{Dataset, Record};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

fn record(value: serde_json::Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn daily_table() -> TableRef {
    TableRef::parse("proj.analytics.daily_visits").unwrap()
}

// ============================================================================
// TableRef Tests
// ============================================================================

#[test]
fn test_table_ref_three_parts() {
    let table = TableRef::parse("dish-second-course.analytics.ga_sessions").unwrap();
    assert_eq!(table.project.as_deref(), Some("dish-second-course"));
    assert_eq!(table.dataset, "analytics");
    assert_eq!(table.table, "ga_sessions");
    assert_eq!(table.qualified(), "\"analytics\".\"ga_sessions\"");
    assert_eq!(table.to_string(), "dish-second-course.analytics.ga_sessions");
}

#[test]
fn test_table_ref_two_parts() {
    let table = TableRef::parse("analytics.daily_visits").unwrap();
    assert!(table.project.is_none());
    assert_eq!(table.to_string(), "analytics.daily_visits");
}

#[test_case("daily_visits" ; "single segment")]
#[test_case("a.b.c.d" ; "too many segments")]
#[test_case("p..t" ; "empty dataset")]
#[test_case("p.d.t-x" ; "dash in table")]
#[test_case("p.d\".t" ; "quote in dataset")]
fn test_table_ref_rejects(id: &str) {
    assert!(matches!(
        TableRef::parse(id),
        Err(Error::InvalidTable { .. })
    ));
}

// ============================================================================
// Schema Tests
// ============================================================================

#[test]
fn test_daily_visits_schema_is_flat() {
    let schema = TableSchema::for_dataset(Dataset::DailyVisits);
    assert_eq!(
        schema.column_names(),
        vec!["total_visits", "visit_date", "source_file"]
    );
    assert!(!schema.is_nested());
    assert_eq!(
        schema.column_definitions(),
        "\"total_visits\" BIGINT, \"visit_date\" DATE, \"source_file\" VARCHAR"
    );
    assert_eq!(
        schema.json_columns(),
        "{'total_visits': 'BIGINT', 'visit_date': 'DATE', 'source_file': 'VARCHAR'}"
    );
}

#[test]
fn test_ga_sessions_schema_is_nested() {
    let schema = TableSchema::for_dataset(Dataset::GaSessions);
    assert!(schema.is_nested());
    assert_eq!(schema.fields().len(), 13);
    assert_eq!(schema.column_names().last(), Some(&"source_file"));

    let custom = schema
        .fields()
        .iter()
        .find(|f| f.name == "customDimensions")
        .unwrap();
    assert_eq!(custom.mode, FieldMode::Repeated);
    assert_eq!(
        custom.duckdb_type(),
        "STRUCT(\"index\" BIGINT, \"value\" VARCHAR)[]"
    );

    let device = schema.fields().iter().find(|f| f.name == "device").unwrap();
    assert_eq!(
        device.duckdb_type(),
        "STRUCT(\"browser\" VARCHAR, \"operatingSystem\" VARCHAR, \"isMobile\" BOOLEAN)"
    );
}

#[test]
fn test_quoting() {
    assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    assert_eq!(quote_literal("/tmp/o'brien.json"), "'/tmp/o''brien.json'");
}

// ============================================================================
// LoadJob Tests
// ============================================================================

#[test]
fn test_load_job_success_path() {
    let mut job = LoadJob::new(daily_table(), "data/x.json");
    assert_eq!(job.state, JobState::Pending);
    assert!(!job.state.is_terminal());

    job.start().unwrap();
    assert_eq!(job.state, JobState::Running);

    job.succeed(12).unwrap();
    assert!(job.state.is_terminal());
    assert!(job.state.is_succeeded());
    assert_eq!(job.rows(), Some(12));
    assert!(job.errors().is_empty());
    assert!(job.finished_at.is_some());
}

#[test]
fn test_load_job_failure_path() {
    let mut job = LoadJob::new(daily_table(), "data/x.json");
    job.start().unwrap();
    job.fail(vec!["bad row".to_string()]).unwrap();

    assert!(job.state.is_failed());
    assert_eq!(job.errors(), ["bad row".to_string()]);
    assert_eq!(job.rows(), None);
}

#[test]
fn test_load_job_rejects_leaving_terminal_state() {
    let mut job = LoadJob::new(daily_table(), "data/x.json");
    job.start().unwrap();
    job.succeed(1).unwrap();

    let err = job.start().unwrap_err();
    assert!(matches!(
        err,
        Error::JobTransition {
            from: "succeeded",
            to: "running",
            ..
        }
    ));
    assert!(job.fail(vec![]).is_err());
    assert!(job.succeed(2).is_err());
    assert_eq!(job.rows(), Some(1));
}

#[test]
fn test_load_job_cannot_succeed_before_running() {
    let mut job = LoadJob::new(daily_table(), "data/x.json");
    assert!(job.succeed(1).is_err());
    assert_eq!(job.state, JobState::Pending);
}

// ============================================================================
// DuckDbWarehouse Tests
// ============================================================================

#[tokio::test]
async fn test_load_flat_rows() {
    let warehouse = DuckDbWarehouse::in_memory("proj").unwrap();
    let table = daily_table();
    let rows = vec![
        record(json!({"total_visits": 12, "visit_date": "2016-08-01", "source_file": "f1"})),
        record(json!({"total_visits": 7, "visit_date": "2016-08-01", "source_file": "f1"})),
    ];

    let job = warehouse
        .load(&table, &TableSchema::daily_visits(), &rows, "f1")
        .await
        .unwrap();

    assert!(job.state.is_succeeded(), "{:?}", job.state);
    assert_eq!(job.rows(), Some(2));
    assert_eq!(job.source_file, "f1");
    assert_eq!(warehouse.row_count(&table).unwrap(), 2);
    assert_eq!(
        warehouse.column_as_strings(&table, "visit_date").unwrap(),
        vec![Some("2016-08-01".to_string()), Some("2016-08-01".to_string())]
    );
}

#[tokio::test]
async fn test_load_uses_compiled_in_json_reader() {
    // Extension downloads are switched off when the connection opens, so a
    // successful load here never touched the network.
    let dir = tempfile::tempdir().unwrap();
    let warehouse = DuckDbWarehouse::open_for_project(dir.path(), "proj").unwrap();
    let table = daily_table();
    let rows = vec![record(
        json!({"total_visits": 5, "visit_date": "2016-08-02", "source_file": "f"}),
    )];

    let job = warehouse
        .load(&table, &TableSchema::daily_visits(), &rows, "f")
        .await
        .unwrap();

    assert!(job.errors().is_empty(), "{:?}", job.errors());
    assert_eq!(job.rows(), Some(1));
}

#[tokio::test]
async fn test_load_appends() {
    let warehouse = DuckDbWarehouse::in_memory("proj").unwrap();
    let table = daily_table();
    let schema = TableSchema::daily_visits();

    for file in ["f1", "f2"] {
        let rows = vec![record(
            json!({"total_visits": 1, "visit_date": "2016-08-01", "source_file": file}),
        )];
        warehouse.load(&table, &schema, &rows, file).await.unwrap();
    }

    assert_eq!(
        warehouse.column_as_strings(&table, "source_file").unwrap(),
        vec![Some("f1".to_string()), Some("f2".to_string())]
    );
}

#[tokio::test]
async fn test_load_ignores_unknown_and_nulls_missing() {
    let warehouse = DuckDbWarehouse::in_memory("proj").unwrap();
    let table = daily_table();
    let rows = vec![record(
        json!({"total_visits": 3, "unexpected": "x", "source_file": "f"}),
    )];

    let job = warehouse
        .load(&table, &TableSchema::daily_visits(), &rows, "f")
        .await
        .unwrap();

    assert!(job.state.is_succeeded(), "{:?}", job.state);
    assert_eq!(
        warehouse.column_as_strings(&table, "visit_date").unwrap(),
        vec![None]
    );
}

#[tokio::test]
async fn test_load_type_mismatch_fails_whole_job() {
    let warehouse = DuckDbWarehouse::in_memory("proj").unwrap();
    let table = daily_table();
    let rows = vec![
        record(json!({"total_visits": 3, "visit_date": "2016-08-01", "source_file": "f"})),
        record(json!({"total_visits": "lots", "visit_date": "2016-08-01", "source_file": "f"})),
    ];

    let job = warehouse
        .load(&table, &TableSchema::daily_visits(), &rows, "f")
        .await
        .unwrap();

    assert!(job.state.is_failed());
    assert!(!job.errors().is_empty());
    assert_eq!(warehouse.row_count(&table).unwrap(), 0);
}

#[tokio::test]
async fn test_load_nested_rows() {
    let warehouse = DuckDbWarehouse::in_memory("proj").unwrap();
    let table = TableRef::parse("analytics.ga_sessions").unwrap();
    let rows = vec![record(json!({
        "fullVisitorId": "123",
        "visitId": 1_470_000_000,
        "date": "2016-08-01",
        "device": {"browser": "Chrome", "isMobile": false},
        "geoNetwork": {"country": "US", "city": "not available in demo dataset"},
        "totals": {"visits": 1, "hits": 3},
        "customDimensions": [{"index": 4, "value": "EMEA"}],
        "hits_sample": [
            {"hitNumber": 1, "isInteraction": true, "pagePath": "/home"},
            {"hitNumber": 2, "isInteraction": false, "pagePath": "/cart"}
        ],
        "source_file": "f"
    }))];

    let job = warehouse
        .load(&table, &TableSchema::ga_sessions(), &rows, "f")
        .await
        .unwrap();

    assert!(job.state.is_succeeded(), "{:?}", job.state);
    assert_eq!(
        warehouse
            .column_as_strings(&table, "\"geoNetwork\".\"country\"")
            .unwrap(),
        vec![Some("US".to_string())]
    );
    assert_eq!(
        warehouse
            .column_as_strings(&table, "len(\"hits_sample\")")
            .unwrap(),
        vec![Some("2".to_string())]
    );
}

#[tokio::test]
async fn test_load_rejects_foreign_project() {
    let warehouse = DuckDbWarehouse::in_memory("proj").unwrap();
    let table = TableRef::parse("other.analytics.daily_visits").unwrap();

    let err = warehouse
        .load(&table, &TableSchema::daily_visits(), &[], "f")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTable { .. }));
}

#[test]
fn test_open_for_project_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let warehouse = DuckDbWarehouse::open_for_project(dir.path().join("wh"), "proj").unwrap();

    assert_eq!(warehouse.project(), "proj");
    let path = warehouse.path().unwrap();
    assert!(path.ends_with("wh/proj.duckdb"));

    warehouse
        .ensure_table(&daily_table(), &TableSchema::daily_visits())
        .unwrap();
    assert_eq!(warehouse.row_count(&daily_table()).unwrap(), 0);
}

#[test]
fn test_open_for_project_requires_project() {
    let dir = tempfile::tempdir().unwrap();
    assert!(DuckDbWarehouse::open_for_project(dir.path(), "").is_err());
}
