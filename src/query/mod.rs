//! Condition compiler
//!
//! Turns structured filter predicates into a parameterized `WHERE` clause
//! with `?` placeholders and an ordered list of bound values.
//!
//! # Overview
//!
//! Conditions are AND-joined in input order. Every value is bound, never
//! interpolated; the only raw text that reaches the clause is a validated
//! column identifier and, for `IN`, a caller-supplied subquery. A condition
//! that cannot be compiled (unknown operator, wrong number of values, bad
//! column name) is dropped with a warning instead of producing malformed SQL.

mod compiler;
mod types;

pub use compiler::{compile, compile_one};
pub use types::{CompiledClause, Condition, Operator, SqlValue};
