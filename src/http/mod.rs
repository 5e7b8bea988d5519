//! HTTP client module
//!
//! Provides the HTTP client shared by the feature-service fetcher and the
//! BigQuery REST client.
//!
//! # Features
//!
//! - **Single-shot requests**: no retries; any non-2xx status is an error
//! - **Authentication**: Integration with auth module
//! - **JSON helpers**: typed request/response bodies

mod client;

pub use client::{HttpClient, HttpClientConfig, RequestBody, RequestConfig};
