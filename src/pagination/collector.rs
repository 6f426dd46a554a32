//! Page-number collection loop
//!
//! Walks pages 1, 2, 3, ... until the API returns a short or empty page.
//! A 429 retries the same page after an exponential wait; any other failure
//! ends the collection and keeps what was already gathered.

use super::types::{BackoffPolicy, Collected, PageFetcher, PaginationState, Termination};
use crate::types::{QueryFilters, Record};
use tracing::{error, info, warn};

/// Collects every page of a paginated endpoint
#[derive(Debug, Clone, Default)]
pub struct PaginatedCollector {
    backoff: BackoffPolicy,
}

impl PaginatedCollector {
    /// Create a collector with the given backoff policy
    pub fn new(backoff: BackoffPolicy) -> Self {
        Self { backoff }
    }

    /// Fetch pages until the data runs out, a fetch fails, or rate-limit
    /// retries are exhausted. Partial results are returned, never an error.
    pub async fn collect<F: PageFetcher + ?Sized>(
        &self,
        fetcher: &F,
        limit: u32,
        filters: &QueryFilters,
    ) -> Collected {
        let mut records: Vec<Record> = Vec::new();
        let mut state = PaginationState::new();
        let mut pages = 0;

        if limit == 0 {
            warn!("Page limit is 0, nothing to fetch for params: {filters:?}");
            return Collected {
                records,
                requests: 0,
                pages,
                retries: 0,
                termination: Termination::EndOfData,
            };
        }

        let termination = loop {
            info!("Fetching page {} with params: {filters:?}", state.page);
            state.requests += 1;

            let page = match fetcher.fetch(state.page, limit, filters).await {
                Ok(page) => page,
                Err(e) if e.is_rate_limited() => {
                    state.add_retry();
                    if state.retry_count > self.backoff.max_retries {
                        error!("Max retries exceeded for rate limiting.");
                        break Termination::RetriesExhausted;
                    }
                    let delay = self.backoff.delay(state.retry_count - 1);
                    warn!("Rate limit reached. Retrying in {delay:?}...");
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(e) if e.is_transport() => {
                    warn!("Request for page {} did not complete: {e}", state.page);
                    break Termination::Failed;
                }
                Err(e) => {
                    warn!("No data returned for page {}: {e}", state.page);
                    break Termination::Failed;
                }
            };

            if page.is_empty() {
                info!("No more records found (page {}).", state.page);
                break Termination::EndOfData;
            }

            let count = page.len();
            pages += 1;
            records.extend(page.records);
            info!("Fetched {count} records (total so far: {}).", records.len());

            if count < limit as usize {
                info!("Last page reached for params: {filters:?}");
                break Termination::LastPage;
            }

            state.next_page();
        };

        Collected {
            records,
            requests: state.requests,
            pages,
            retries: state.total_retries,
            termination,
        }
    }
}
