//! Pagination types and traits
//!
//! Defines the page request, the envelope returned for one page and the
//! source abstraction the aggregator pulls pages from.

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Reserved envelope key holding the row count; metadata, never a row
pub const TOTAL_KEY: &str = "_total";

/// Page size used when none is configured
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Filters and nested sub-resources for a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    /// Column → value, sent as `_filter[column]=value`
    pub filter: BTreeMap<String, String>,
    /// Sub-resources, sent as repeated `_nested[]=name`
    pub nested: Vec<String>,
}

impl Params {
    /// Empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column filter
    #[must_use]
    pub fn with_filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter.insert(column.into(), value.into());
        self
    }

    /// Request a nested sub-resource
    #[must_use]
    pub fn with_nested(mut self, name: impl Into<String>) -> Self {
        self.push_nested(name);
        self
    }

    /// Request a nested sub-resource unless it is already requested
    pub fn push_nested(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.has_nested(&name) {
            self.nested.push(name);
        }
    }

    /// Whether `name` is among the nested sub-resources
    pub fn has_nested(&self, name: &str) -> bool {
        self.nested.iter().any(|n| n == name)
    }
}

/// One request to a page source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Endpoint path below the API root (e.g. `users`)
    pub endpoint: String,
    /// Filters and nested sub-resources
    pub params: Params,
    /// Zero-based page index; `None` for an unpaginated fetch
    pub page: Option<u32>,
    /// Page size
    pub count: u32,
}

impl PageRequest {
    /// Request for page `page` of `endpoint`
    pub fn page(endpoint: impl Into<String>, params: Params, page: u32, count: u32) -> Self {
        Self {
            endpoint: endpoint.into(),
            params,
            page: Some(page),
            count,
        }
    }

    /// Request without pagination parameters
    pub fn single(endpoint: impl Into<String>, params: Params) -> Self {
        Self {
            endpoint: endpoint.into(),
            params,
            page: None,
            count: DEFAULT_PAGE_SIZE,
        }
    }

    /// Query pairs in wire order, excluding the API key
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .params
            .filter
            .iter()
            .map(|(column, value)| (format!("_filter[{column}]"), value.clone()))
            .collect();

        pairs.extend(
            self.params
                .nested
                .iter()
                .map(|name| ("_nested[]".to_string(), name.clone())),
        );

        if let Some(page) = self.page {
            pairs.push(("_page".to_string(), page.to_string()));
            pairs.push(("_count".to_string(), self.count.to_string()));
        }

        pairs
    }
}

/// The JSON object returned for one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope(Map<String, Value>);

impl Envelope {
    /// Validate a response body
    ///
    /// A body that is not an object is a decode error. An object carrying
    /// `error: true` is an API error with its `message`.
    pub fn from_value(body: Value) -> Result<Self> {
        let Value::Object(map) = body else {
            return Err(Error::decode(format!(
                "expected a JSON object, got {}",
                json_type(&body)
            )));
        };

        if map.get("error").and_then(Value::as_bool) == Some(true) {
            let message = map
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(Error::api(message));
        }

        Ok(Self(map))
    }

    /// Number of raw entries, `_total` included
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the envelope has no entries at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Data rows with their row keys, `_total` skipped
    pub fn rows(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0
            .iter()
            .filter(|(key, _)| key.as_str() != TOTAL_KEY)
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Value of `_total`, when present and numeric
    pub fn total(&self) -> Option<u64> {
        match self.0.get(TOTAL_KEY)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Anything that can return one page of a listing
pub trait PageSource: Send + Sync {
    /// Fetch one page
    fn fetch(&self, request: &PageRequest) -> Result<Envelope>;
}

impl<T: PageSource + ?Sized> PageSource for Box<T> {
    fn fetch(&self, request: &PageRequest) -> Result<Envelope> {
        (**self).fetch(request)
    }
}

impl<T: PageSource + ?Sized> PageSource for &T {
    fn fetch(&self, request: &PageRequest) -> Result<Envelope> {
        (**self).fetch(request)
    }
}

/// Tracks progress through a paginated listing
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Next page index to fetch
    pub page: u32,
    /// Pages fetched so far
    pub pages_fetched: u32,
    /// Data rows seen so far (`_total` excluded)
    pub rows_seen: u64,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fetched page and decide whether another one follows
    ///
    /// Stops when the envelope holds fewer than `page_size + 1` raw entries.
    /// The count includes `_total`, so an endpoint that omits it ends one
    /// page early.
    pub fn advance(&mut self, envelope: &Envelope, page_size: u32) {
        self.pages_fetched += 1;
        self.rows_seen += envelope.rows().count() as u64;

        if envelope.len() < page_size as usize + 1 {
            self.done = true;
        } else {
            self.page += 1;
        }
    }
}

/// A listing result: what was accumulated plus the error that ended it early
///
/// A failed fetch does not discard earlier pages.
#[derive(Debug)]
pub struct Listing<T> {
    /// Accumulated records
    pub records: T,
    /// Error that terminated pagination, if any
    pub error: Option<Error>,
}

impl<T> Listing<T> {
    /// A listing that ran to completion
    pub fn complete(records: T) -> Self {
        Self {
            records,
            error: None,
        }
    }

    /// A listing cut short by `error`
    pub fn partial(records: T, error: Error) -> Self {
        Self {
            records,
            error: Some(error),
        }
    }

    /// Whether every page was fetched
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Records and terminating error
    pub fn into_parts(self) -> (T, Option<Error>) {
        (self.records, self.error)
    }

    /// Records if complete, otherwise the error (partial records are dropped)
    pub fn into_result(self) -> Result<T> {
        match self.error {
            None => Ok(self.records),
            Some(err) => Err(err),
        }
    }

    /// Transform the records, keeping the error
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Listing<U> {
        Listing {
            records: f(self.records),
            error: self.error,
        }
    }
}
