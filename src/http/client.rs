//! API gateway client
//!
//! Issues GET requests against the analytics gateway and classifies every
//! outcome into a decoded [`Page`] or a typed [`Error`]:
//! - timeouts, connection failures and other transport errors
//! - non-2xx statuses, with 429 reported as [`Error::RateLimited`]
//! - bodies that are not valid JSON or lack a usable `records` array
//!
//! The client does not retry. Rate-limit backoff belongs to the collector.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::pagination::{Page, PageFetcher};
use crate::types::{Dataset, QueryFilters};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, info};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        let mut default_headers = HashMap::new();
        default_headers.insert("Accept".to_string(), "application/json".to_string());
        Self {
            base_url: String::new(),
            timeout: Duration::from_secs(10),
            rate_limit: None,
            default_headers,
            user_agent: format!("analytics-etl/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    /// Build from the `api` section of the pipeline config
    pub fn from_api_config(api: &ApiConfig) -> Self {
        let mut builder = Self::builder()
            .base_url(&api.base_url)
            .timeout(api.timeout());
        if let Some(key) = &api.api_key {
            builder = builder.api_key(key);
        }
        if let Some(rps) = api.requests_per_second {
            builder = builder.rate_limit(RateLimiterConfig::per_second(rps));
        }
        builder.build()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the API key header
    pub fn api_key(self, key: impl Into<String>) -> Self {
        self.header(API_KEY_HEADER, key)
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Client for the analytics API gateway
///
/// Constructed once per process and passed by reference to every caller.
pub struct ApiClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
}

impl ApiClient {
    /// Create a client from its configuration
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// GET `{base_url}/{endpoint}` and decode the JSON body
    pub async fn get_json(&self, endpoint: &str, query: &[(String, String)]) -> Result<Value> {
        let url = self.build_url(endpoint);

        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let mut req = self.client.get(&url);
        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if !query.is_empty() {
            req = req.query(query);
        }

        debug!("GET {url} {query:?}");
        let response = match req.send().await {
            Ok(response) => response,
            Err(e) => return Err(self.classify_transport(&url, e)),
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_seconds = extract_retry_after(&response);
            error!("HTTP error 429 from {url}: rate limited");
            return Err(Error::RateLimited {
                retry_after_seconds,
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("HTTP error {}: {body}", status.as_u16());
            return Err(Error::http_status(status.as_u16(), body));
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return Err(self.classify_transport(&url, e)),
        };
        serde_json::from_str(&text).map_err(|e| {
            error!("Invalid JSON response from {url}: {e}");
            Error::decode(format!("Invalid JSON response from {url}: {e}"))
        })
    }

    /// Fetch one page of a dataset
    pub async fn fetch_page(
        &self,
        dataset: Dataset,
        page: u32,
        limit: u32,
        filters: &[(String, String)],
    ) -> Result<Page> {
        let mut query = Vec::with_capacity(filters.len() + 2);
        query.push(("page".to_string(), page.to_string()));
        query.push(("limit".to_string(), limit.to_string()));
        query.extend(filters.iter().cloned());

        let body = self.get_json(dataset.endpoint(), &query).await?;
        let page = Page::from_body(body)?;

        match dataset {
            Dataset::DailyVisits => info!("Fetched {} daily visits.", page.len()),
            Dataset::GaSessions => info!(
                "Fetched {} GA sessions with pagination info: {}",
                page.len(),
                page.pagination
                    .as_ref()
                    .map_or_else(|| "{}".to_string(), |p| p.to_string())
            ),
        }
        Ok(page)
    }

    /// Page fetcher bound to one dataset
    pub fn fetcher(&self, dataset: Dataset) -> DatasetFetcher<'_> {
        DatasetFetcher {
            client: self,
            dataset,
        }
    }

    /// Build full URL from an endpoint path
    fn build_url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    fn classify_transport(&self, url: &str, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            error!("Request to {url} timed out.");
            Error::Timeout {
                timeout_ms: self.config.timeout.as_millis() as u64,
            }
        } else if e.is_connect() {
            error!("Connection error occurred while connecting to {url}");
            Error::Connection {
                message: e.to_string(),
            }
        } else {
            error!("Unexpected error requesting {url}: {e}");
            Error::Http(e)
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// [`PageFetcher`] that reads one dataset through an [`ApiClient`]
#[derive(Debug, Clone, Copy)]
pub struct DatasetFetcher<'a> {
    client: &'a ApiClient,
    dataset: Dataset,
}

#[async_trait]
impl PageFetcher for DatasetFetcher<'_> {
    async fn fetch(&self, page: u32, limit: u32, filters: &QueryFilters) -> Result<Page> {
        self.client
            .fetch_page(self.dataset, page, limit, filters)
            .await
    }
}

/// Extract retry-after header value
fn extract_retry_after(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}
