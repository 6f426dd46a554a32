//! Tests for pagination module

use super::*;
use crate::error::{Error, Result};
use crate::types::{QueryFilters, Record};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Fetcher that replays scripted responses and records requested pages
struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<Page>>>,
    calls: Mutex<Vec<(u32, u32, QueryFilters)>>,
}

impl ScriptedFetcher {
    fn new(responses: Vec<Result<Page>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn pages_requested(&self) -> Vec<u32> {
        self.calls.lock().unwrap().iter().map(|c| c.0).collect()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, page: u32, limit: u32, filters: &QueryFilters) -> Result<Page> {
        self.calls
            .lock()
            .unwrap()
            .push((page, limit, filters.clone()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Page::default()))
    }
}

fn records(n: usize, offset: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            json!({"id": offset + i})
                .as_object()
                .cloned()
                .unwrap()
        })
        .collect()
}

fn page(n: usize, offset: usize) -> Result<Page> {
    Ok(Page::new(records(n, offset)))
}

fn rate_limited() -> Result<Page> {
    Err(Error::RateLimited {
        retry_after_seconds: None,
    })
}

fn fast_collector() -> PaginatedCollector {
    PaginatedCollector::new(BackoffPolicy::new(
        Duration::from_millis(1),
        Duration::from_millis(4),
        5,
    ))
}

fn day_filters() -> QueryFilters {
    vec![
        ("start_date".to_string(), "2016-08-01".to_string()),
        ("end_date".to_string(), "2016-08-01".to_string()),
    ]
}

// ============================================================================
// Page Tests
// ============================================================================

#[test]
fn test_page_from_body() {
    let body = json!({
        "records": [{"total_visits": 12, "visit_date": "2016-08-01"}],
        "pagination": {"page": 1, "limit": 50}
    });
    let page = Page::from_body(body).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page.records[0]["total_visits"], json!(12));
    assert_eq!(page.pagination, Some(json!({"page": 1, "limit": 50})));
}

#[test]
fn test_page_from_body_without_records_is_empty() {
    assert!(Page::from_body(json!({"pagination": {}})).unwrap().is_empty());
    assert!(Page::from_body(json!({"records": null})).unwrap().is_empty());
}

#[test]
fn test_page_from_body_rejects_bad_shapes() {
    assert!(matches!(
        Page::from_body(json!([1, 2])),
        Err(Error::Decode { .. })
    ));
    assert!(matches!(
        Page::from_body(json!({"records": "nope"})),
        Err(Error::Decode { .. })
    ));
    assert!(matches!(
        Page::from_body(json!({"records": [1]})),
        Err(Error::Decode { .. })
    ));
}

// ============================================================================
// BackoffPolicy Tests
// ============================================================================

#[test]
fn test_backoff_defaults() {
    let policy = BackoffPolicy::default();
    assert_eq!(policy.delay(0), Duration::from_secs(2));
    assert_eq!(policy.delay(1), Duration::from_secs(4));
    assert_eq!(policy.delay(2), Duration::from_secs(8));
    assert_eq!(policy.delay(4), Duration::from_secs(32));
    assert_eq!(policy.delay(5), Duration::from_secs(60));
    assert_eq!(policy.delay(40), Duration::from_secs(60));
    assert_eq!(policy.max_retries, 5);
}

#[test]
fn test_pagination_state() {
    let mut state = PaginationState::new();
    assert_eq!(state.page, 1);

    state.add_retry();
    state.add_retry();
    assert_eq!(state.retry_count, 2);

    state.next_page();
    assert_eq!(state.page, 2);
    assert_eq!(state.retry_count, 0);
    assert_eq!(state.total_retries, 2);
}

// ============================================================================
// Collector Tests
// ============================================================================

#[tokio::test]
async fn test_collect_full_pages_then_short_page() {
    let fetcher = ScriptedFetcher::new(vec![page(50, 0), page(50, 50), page(23, 100)]);

    let collected = fast_collector().collect(&fetcher, 50, &day_filters()).await;

    assert_eq!(collected.records.len(), 123);
    assert_eq!(collected.requests, 3);
    assert_eq!(collected.pages, 3);
    assert_eq!(collected.termination, Termination::LastPage);
    assert_eq!(fetcher.pages_requested(), vec![1, 2, 3]);
    assert_eq!(collected.records[122]["id"], json!(122));
}

#[tokio::test]
async fn test_collect_passes_limit_and_filters() {
    let fetcher = ScriptedFetcher::new(vec![page(3, 0)]);

    fast_collector().collect(&fetcher, 10, &day_filters()).await;

    let calls = fetcher.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, 10);
    assert_eq!(calls[0].2, day_filters());
}

#[tokio::test]
async fn test_collect_full_page_requests_next_page() {
    let fetcher = ScriptedFetcher::new(vec![page(5, 0), page(0, 0)]);

    let collected = fast_collector().collect(&fetcher, 5, &day_filters()).await;

    assert_eq!(fetcher.pages_requested(), vec![1, 2]);
    assert_eq!(collected.records.len(), 5);
    assert_eq!(collected.termination, Termination::EndOfData);
}

#[tokio::test]
async fn test_collect_empty_first_page() {
    let fetcher = ScriptedFetcher::new(vec![page(0, 0), page(5, 0)]);

    let collected = fast_collector().collect(&fetcher, 5, &day_filters()).await;

    assert!(collected.records.is_empty());
    assert_eq!(collected.requests, 1);
    assert_eq!(collected.termination, Termination::EndOfData);
    assert!(collected.is_complete());
}

#[tokio::test]
async fn test_collect_short_page_stops_without_extra_request() {
    let fetcher = ScriptedFetcher::new(vec![page(4, 0), page(5, 0)]);

    let collected = fast_collector().collect(&fetcher, 5, &day_filters()).await;

    assert_eq!(fetcher.pages_requested(), vec![1]);
    assert_eq!(collected.records.len(), 4);
}

#[tokio::test]
async fn test_collect_retries_same_page_on_rate_limit() {
    let fetcher = ScriptedFetcher::new(vec![
        page(2, 0),
        rate_limited(),
        rate_limited(),
        rate_limited(),
        rate_limited(),
        rate_limited(),
        page(1, 2),
    ]);

    let collected = fast_collector().collect(&fetcher, 2, &day_filters()).await;

    assert_eq!(fetcher.pages_requested(), vec![1, 2, 2, 2, 2, 2, 2]);
    assert_eq!(collected.records.len(), 3);
    assert_eq!(collected.retries, 5);
    assert_eq!(collected.termination, Termination::LastPage);
}

#[tokio::test]
async fn test_collect_aborts_after_retry_ceiling() {
    let mut responses = vec![page(2, 0)];
    responses.extend((0..6).map(|_| rate_limited()));
    responses.push(page(2, 2));
    let fetcher = ScriptedFetcher::new(responses);

    let collected = fast_collector().collect(&fetcher, 2, &day_filters()).await;

    assert_eq!(collected.termination, Termination::RetriesExhausted);
    assert!(!collected.is_complete());
    // Only the page gathered before the throttled one survives
    assert_eq!(collected.records.len(), 2);
    assert_eq!(fetcher.pages_requested(), vec![1, 2, 2, 2, 2, 2, 2]);
}

#[tokio::test]
async fn test_collect_retry_counter_resets_per_page() {
    let fetcher = ScriptedFetcher::new(vec![
        rate_limited(),
        rate_limited(),
        rate_limited(),
        rate_limited(),
        page(1, 0),
        rate_limited(),
        rate_limited(),
        rate_limited(),
        rate_limited(),
        page(0, 0),
    ]);

    let collected = fast_collector().collect(&fetcher, 1, &day_filters()).await;

    assert_eq!(collected.termination, Termination::EndOfData);
    assert_eq!(collected.retries, 8);
    assert_eq!(collected.records.len(), 1);
}

#[tokio::test]
async fn test_collect_stops_on_hard_failure_keeping_partial() {
    let fetcher = ScriptedFetcher::new(vec![
        page(3, 0),
        Err(Error::http_status(500, "boom")),
        page(3, 3),
    ]);

    let collected = fast_collector().collect(&fetcher, 3, &day_filters()).await;

    assert_eq!(collected.termination, Termination::Failed);
    assert_eq!(collected.records.len(), 3);
    assert_eq!(fetcher.pages_requested(), vec![1, 2]);
}

#[tokio::test]
async fn test_collect_does_not_retry_transport_errors() {
    let fetcher = ScriptedFetcher::new(vec![
        Err(Error::Timeout { timeout_ms: 10 }),
        page(3, 0),
    ]);

    let collected = fast_collector().collect(&fetcher, 3, &day_filters()).await;

    assert_eq!(collected.termination, Termination::Failed);
    assert_eq!(collected.requests, 1);
}

#[tokio::test]
async fn test_collect_zero_limit_issues_no_requests() {
    let fetcher = ScriptedFetcher::new(vec![page(3, 0)]);

    let collected = fast_collector().collect(&fetcher, 0, &day_filters()).await;

    assert_eq!(collected.requests, 0);
    assert!(fetcher.pages_requested().is_empty());
}
