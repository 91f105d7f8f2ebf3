//! Field descriptor types
//!
//! A record's decoding contract is a static table of [`FieldSpec`]s.
//! The slot variant fixes both the target kind and the setter, so the
//! mapper can never be handed a field it has no coercion rule for.

use super::mapper::FieldMapper;
use crate::temporal::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Semantic target type of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// UTF-8 text, zero value `""`
    Text,
    /// Signed integer, zero value `0`
    Integer,
    /// Floating point, zero value `0.0`
    Decimal,
    /// Timestamp, zero value "no timestamp"
    Timestamp,
    /// Boolean flag, zero value `false`
    Flag,
    /// Raw JSON value stored unconverted, zero value `null`
    Raw,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Decimal => "decimal",
            FieldKind::Timestamp => "timestamp",
            FieldKind::Flag => "flag",
            FieldKind::Raw => "raw",
        };
        f.write_str(name)
    }
}

/// Typed setter for one field of `T`
pub enum Slot<T> {
    Text(fn(&mut T, String)),
    Integer(fn(&mut T, i64)),
    Decimal(fn(&mut T, f64)),
    Timestamp(fn(&mut T, Timestamp)),
    Flag(fn(&mut T, bool)),
    Raw(fn(&mut T, Value)),
}

impl<T> Slot<T> {
    /// Target kind of this slot
    pub fn kind(&self) -> FieldKind {
        match self {
            Slot::Text(_) => FieldKind::Text,
            Slot::Integer(_) => FieldKind::Integer,
            Slot::Decimal(_) => FieldKind::Decimal,
            Slot::Timestamp(_) => FieldKind::Timestamp,
            Slot::Flag(_) => FieldKind::Flag,
            Slot::Raw(_) => FieldKind::Raw,
        }
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot::{:?}", self.kind())
    }
}

/// One entry of a record's field table
#[derive(Debug)]
pub struct FieldSpec<T: 'static> {
    /// Key under which the raw value appears in the source payload
    pub key: &'static str,
    /// Target kind and setter
    pub slot: Slot<T>,
}

/// Static field dictionary of a record type
///
/// Usually generated by the `record_shape!` macro.
pub trait FieldTable: Sized + 'static {
    /// Record type name used in diagnostics
    const NAME: &'static str;

    /// Field table, in declaration order
    fn fields() -> &'static [FieldSpec<Self>];

    /// Source keys, in declaration order
    fn source_keys() -> Vec<&'static str> {
        Self::fields().iter().map(|f| f.key).collect()
    }
}

/// A record the [`FieldMapper`] can decode
pub trait RecordShape: FieldTable + Default {
    /// Decode child collections found under the `nested` wrapper
    ///
    /// Records without children keep the default no-op.
    fn attach_nested(&mut self, _nested: &Map<String, Value>, _mapper: &FieldMapper<'_>) {}
}
