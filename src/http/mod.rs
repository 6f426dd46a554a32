//! HTTP client module
//!
//! API gateway client for the analytics endpoints.
//!
//! # Features
//!
//! - **API key header**: every request carries `X-API-Key`
//! - **Typed failures**: 429 maps to `Error::RateLimited`, never string matching
//! - **Pacing**: optional token bucket rate limiter using governor

mod client;
mod rate_limit;

pub use client::{
    ApiClient, DatasetFetcher, HttpClientConfig, HttpClientConfigBuilder, API_KEY_HEADER,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
