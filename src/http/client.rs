//! Blocking HTTP client and the API page source built on it
//!
//! Provides:
//! - A small blocking client with base URL, timeouts and default headers
//! - Status classification into transport errors
//! - [`HttpPageSource`], which fetches one listing page per call and masks
//!   the API key in everything it logs
//!
//! Requests are never retried; a failed page ends the listing.

use crate::error::{Error, Result};
use crate::pagination::{Envelope, PageRequest, PageSource};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// Query parameter carrying the API key
pub const API_KEY_PARAM: &str = "_key";

const MASK: &str = "****";

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(30),
            default_headers: HashMap::new(),
            user_agent: format!("amember-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
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
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
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

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters, in order; keys may repeat
    pub query: Vec<(String, String)>,
    /// Request headers
    pub headers: HashMap<String, String>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append several query parameters
    #[must_use]
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// Blocking HTTP client
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, config })
    }

    /// Client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Resolve `path` against the base URL and append the query
    pub fn build_url(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let joined = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            match &self.config.base_url {
                Some(base) => {
                    let base = base.trim_end_matches('/');
                    let path = path.trim_start_matches('/');
                    format!("{base}/{path}")
                }
                None => path.to_string(),
            }
        };

        let mut url = Url::parse(&joined)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }

    /// Make a GET request
    ///
    /// Non-success statuses become [`Error::HttpStatus`] with the body text.
    pub fn get(&self, path: &str, config: &RequestConfig) -> Result<Response> {
        let url = self.build_url(path, &config.query)?;
        let mut req = self.client.get(url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        for (key, value) in &config.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        let response = req.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::http_status(status.as_u16(), body));
        }

        Ok(response)
    }

    /// Make a GET request and parse the JSON body
    ///
    /// A body that is not valid JSON is a decode error, not a transport one.
    pub fn get_json<T: DeserializeOwned>(&self, path: &str, config: &RequestConfig) -> Result<T> {
        let text = self.get(path, config)?.text()?;
        serde_json::from_str(&text)
            .map_err(|e| Error::decode(format!("response is not valid JSON: {e}")))
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Fetches listing pages from the REST API
///
/// Every request carries the API key as `_key`; logged URLs show it masked.
pub struct HttpPageSource {
    client: HttpClient,
    api_key: String,
}

impl HttpPageSource {
    /// Create a page source; `client` should carry the API root as base URL
    pub fn new(client: HttpClient, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    /// URL for `request` with the key replaced by a mask
    pub fn masked_url(&self, request: &PageRequest) -> Result<Url> {
        self.client
            .build_url(&request.endpoint, &query_with_key(request, MASK))
    }

    /// The underlying client
    pub fn client(&self) -> &HttpClient {
        &self.client
    }
}

impl PageSource for HttpPageSource {
    fn fetch(&self, request: &PageRequest) -> Result<Envelope> {
        let masked = self.masked_url(request)?;
        let config = RequestConfig::new()
            .header("Accept", "application/json")
            .query_pairs(query_with_key(request, &self.api_key));
        let started = Instant::now();

        debug!(url = %masked, "GET");
        let body: Value = self
            .client
            .get_json(&request.endpoint, &config)
            .map_err(api_error_from_status)?;
        debug!(
            url = %masked,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "response received"
        );

        Envelope::from_value(body)
    }
}

impl std::fmt::Debug for HttpPageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPageSource")
            .field("client", &self.client)
            .field("api_key", &MASK)
            .finish()
    }
}

fn query_with_key(request: &PageRequest, key: &str) -> Vec<(String, String)> {
    let mut pairs = vec![(API_KEY_PARAM.to_string(), key.to_string())];
    pairs.extend(request.query_pairs());
    pairs
}

/// An error envelope served with a non-success status is still an API error
fn api_error_from_status(err: Error) -> Error {
    match err {
        Error::HttpStatus { status, body } => serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| Envelope::from_value(value).err())
            .filter(Error::is_api)
            .unwrap_or(Error::HttpStatus { status, body }),
        other => other,
    }
}
