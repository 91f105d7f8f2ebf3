//! Record decoding
//!
//! Maps loosely-typed JSON payloads onto typed records.
//!
//! # Overview
//!
//! Every record type declares a static field table: one [`FieldSpec`] per
//! field, pairing the source key with a typed [`Slot`]. The [`FieldMapper`]
//! walks that table and coerces each raw value with the rule for the slot's
//! kind. Coercion problems become [`Diagnostic`]s reported to a
//! [`DiagnosticSink`]; they never abort the record.

mod diagnostics;
mod mapper;
mod types;

pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, MemorySink, TracingSink};
pub use mapper::{FieldMapper, NESTED_KEY};
pub use types::{FieldKind, FieldSpec, FieldTable, RecordShape, Slot};
