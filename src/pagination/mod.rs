//! Pagination module
//!
//! Walks the API's page-numbered listings and merges the pages into one
//! keyed collection.
//!
//! # Overview
//!
//! Pages are requested with `_page` (zero-based) and `_count`. Each page is
//! an [`Envelope`]: data rows keyed by an opaque row key plus a reserved
//! `_total` entry. The walk stops once an envelope holds fewer than
//! `page_size + 1` entries. A failed fetch ends the walk early and the rows
//! gathered so far are returned in a [`Listing`] next to the error.

mod aggregator;
mod types;

pub use aggregator::Paginator;
pub use types::{
    Envelope, Listing, PageRequest, PageSource, PaginationState, Params, DEFAULT_PAGE_SIZE,
    TOTAL_KEY,
};

#[cfg(test)]
mod tests;
