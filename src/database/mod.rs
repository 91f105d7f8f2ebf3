//! Relational mirror of the membership database
//!
//! DuckDB is the query engine. A MySQL source is attached read-only through
//! the `mysql` extension; a DuckDB file or in-memory database works the same
//! way for local mirrors and tests.

mod engine;
mod rows;

pub use engine::DatabaseEngine;
pub use rows::{DbAccess, DbUser, PaymentSummary};
