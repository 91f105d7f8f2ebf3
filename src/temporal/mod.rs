//! Temporal value parsing
//!
//! The membership API serializes dates in several textual layouts, sometimes
//! within the same record. Layout selection works on the *shape* of the input:
//! every digit is masked with `x` and the result is looked up in a table of
//! known shapes, so adding a layout is one table row.
//!
//! Parsed values always serialize back with the first layout
//! (`YYYY-MM-DD HH:MM:SS`). This is a one-way normalization.

mod parser;

pub use parser::{parse_timestamp, shape_of, Timestamp, TimestampError, CANONICAL_FORMAT};

#[cfg(test)]
mod tests;
