//! HTTP client module
//!
//! Provides the HTTP client with connection retry and a token bucket rate
//! limiter.
//!
//! # Retry policy
//!
//! - **Connection failures**: retried after a fixed delay (60s by default),
//!   without limit unless a cap is configured
//! - **HTTP status errors**: never retried; the caller stops the endpoint

mod client;
mod rate_limit;

pub use client::{
    HttpClient, HttpClientConfig, HttpClientConfigBuilder, API_KEY_HEADER, DEFAULT_BASE_URL,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
