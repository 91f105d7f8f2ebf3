//! Page-by-page aggregation into keyed collections

use super::types::{Listing, PageRequest, PageSource, PaginationState, Params, DEFAULT_PAGE_SIZE};
use crate::decode::{DiagnosticSink, FieldMapper, RecordShape};
use serde_json::Value;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;
use tracing::{debug, info};

/// Walks a paginated endpoint and folds every row into an accumulator
///
/// Pages are fetched strictly one at a time, in increasing order, because
/// later pages overwrite earlier entries by key.
pub struct Paginator<'a> {
    source: &'a dyn PageSource,
    mapper: FieldMapper<'a>,
    page_size: u32,
}

impl<'a> Paginator<'a> {
    /// Create a paginator with the default page size
    pub fn new(source: &'a dyn PageSource, sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            source,
            mapper: FieldMapper::new(sink),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the page size (zero falls back to the default)
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };
        self
    }

    /// Page size in use
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The mapper rows are decoded with
    pub fn mapper(&self) -> FieldMapper<'a> {
        self.mapper
    }

    /// Fold every data row of every page into `acc`
    ///
    /// `merge` receives the row key and the raw row. On a fetch failure the
    /// accumulator is returned as-is together with the error.
    pub fn fold_rows<A>(
        &self,
        endpoint: &str,
        params: &Params,
        mut acc: A,
        mut merge: impl FnMut(&mut A, &str, &Value),
    ) -> Listing<A> {
        let mut state = PaginationState::new();
        let started = Instant::now();

        while !state.done {
            let request = PageRequest::page(endpoint, params.clone(), state.page, self.page_size);
            let page_started = Instant::now();

            let envelope = match self.source.fetch(&request) {
                Ok(envelope) => envelope,
                Err(err) => {
                    debug!(
                        endpoint,
                        page = state.page,
                        error = %err,
                        "page fetch failed, returning partial listing"
                    );
                    return Listing::partial(acc, err);
                }
            };

            for (row_key, row) in envelope.rows() {
                merge(&mut acc, row_key, row);
            }

            debug!(
                endpoint,
                page = state.page,
                entries = envelope.len(),
                elapsed_ms = page_started.elapsed().as_millis() as u64,
                "page fetched"
            );

            state.advance(&envelope, self.page_size);
        }

        info!(
            endpoint,
            pages = state.pages_fetched,
            rows = state.rows_seen,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "listing complete"
        );

        Listing::complete(acc)
    }

    /// Decode every row, keep those passing `keep`, merge by natural key
    ///
    /// A later row with the same key replaces the earlier one.
    pub fn collect_keyed<T, K>(
        &self,
        endpoint: &str,
        params: &Params,
        key: impl Fn(&T) -> K,
        keep: impl Fn(&T) -> bool,
    ) -> Listing<HashMap<K, T>>
    where
        T: RecordShape,
        K: Eq + Hash,
    {
        let mapper = self.mapper;
        self.fold_rows(endpoint, params, HashMap::new(), |acc, row_key, row| {
            if let Some(record) = mapper.decode_value::<T>(row_key, row) {
                if keep(&record) {
                    acc.insert(key(&record), record);
                }
            }
        })
    }

    /// Decode every row, keep those passing `keep`, group by `key`
    ///
    /// Each group keeps rows in the order they were fetched.
    pub fn collect_grouped<T, K>(
        &self,
        endpoint: &str,
        params: &Params,
        key: impl Fn(&T) -> K,
        keep: impl Fn(&T) -> bool,
    ) -> Listing<HashMap<K, Vec<T>>>
    where
        T: RecordShape,
        K: Eq + Hash,
    {
        let mapper = self.mapper;
        self.fold_rows(
            endpoint,
            params,
            HashMap::new(),
            |acc: &mut HashMap<K, Vec<T>>, row_key, row| {
                if let Some(record) = mapper.decode_value::<T>(row_key, row) {
                    if keep(&record) {
                        acc.entry(key(&record)).or_default().push(record);
                    }
                }
            },
        )
    }
}

impl std::fmt::Debug for Paginator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}
