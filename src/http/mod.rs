//! HTTP client module
//!
//! Provides a blocking HTTP client and the page source that talks to the
//! membership REST API.
//!
//! # Features
//!
//! - **Builder configuration**: base URL, timeouts, default headers
//! - **Typed failures**: transport errors and non-success statuses stay
//!   distinct from API errors reported inside the response envelope
//! - **Key masking**: the API key never appears in logs

mod client;

pub use client::{
    HttpClient, HttpClientConfig, HttpClientConfigBuilder, HttpPageSource, RequestConfig,
    API_KEY_PARAM,
};
