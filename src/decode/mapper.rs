//! Field-by-field coercion of untyped payloads into typed records

use super::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use super::types::{FieldKind, FieldSpec, RecordShape, Slot};
use crate::temporal::{parse_timestamp, Timestamp};
use serde_json::{Map, Value};

/// Key of the wrapper object holding child collections
pub const NESTED_KEY: &str = "nested";

/// Decodes payloads into records, reporting every skipped field
#[derive(Clone, Copy)]
pub struct FieldMapper<'a> {
    sink: &'a dyn DiagnosticSink,
}

impl<'a> FieldMapper<'a> {
    /// Create a mapper reporting to `sink`
    pub fn new(sink: &'a dyn DiagnosticSink) -> Self {
        Self { sink }
    }

    /// The sink diagnostics are reported to
    pub fn sink(&self) -> &'a dyn DiagnosticSink {
        self.sink
    }

    /// Decode one payload object
    ///
    /// Fields whose key is absent or null keep their zero value. A field
    /// that fails coercion keeps its zero value and produces a diagnostic;
    /// the remaining fields are still decoded.
    pub fn decode<T: RecordShape>(&self, payload: &Map<String, Value>) -> T {
        let mut record = T::default();

        for spec in T::fields() {
            let Some(raw) = payload.get(spec.key) else {
                self.report::<T>(spec.key, Value::Null, DiagnosticKind::MissingKey);
                continue;
            };

            if raw.is_null() {
                continue;
            }

            self.apply(&mut record, spec, raw);
        }

        match payload.get(NESTED_KEY) {
            Some(Value::Object(nested)) => record.attach_nested(nested, self),
            Some(Value::Null) | None => {}
            Some(other) => {
                self.report::<T>(NESTED_KEY, other.clone(), DiagnosticKind::MalformedRow);
            }
        }

        record
    }

    /// Decode a value that should be an object
    ///
    /// Returns `None` (and reports the row) when it is not.
    pub fn decode_value<T: RecordShape>(&self, row_key: &str, value: &Value) -> Option<T> {
        match value {
            Value::Object(payload) => Some(self.decode(payload)),
            other => {
                self.report::<T>(row_key, other.clone(), DiagnosticKind::MalformedRow);
                None
            }
        }
    }

    /// Decode every object of a nested array, in source order
    ///
    /// A missing or null collection is empty. Non-object entries are skipped.
    pub fn decode_list<T: RecordShape>(&self, key: &str, value: Option<&Value>) -> Vec<T> {
        match value {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entries)) => entries
                .iter()
                .enumerate()
                .filter_map(|(i, entry)| self.decode_value(&format!("{key}[{i}]"), entry))
                .collect(),
            Some(other) => {
                self.report::<T>(key, other.clone(), DiagnosticKind::MalformedRow);
                Vec::new()
            }
        }
    }

    fn apply<T: RecordShape>(&self, record: &mut T, spec: &FieldSpec<T>, raw: &Value) {
        let outcome = match &spec.slot {
            Slot::Text(set) => coerce_text(raw).map(|v| set(record, v)),
            Slot::Integer(set) => coerce_integer(raw).map(|v| set(record, v)),
            Slot::Decimal(set) => coerce_decimal(raw).map(|v| set(record, v)),
            Slot::Timestamp(set) => coerce_timestamp(raw).map(|v| {
                if let Some(ts) = v {
                    set(record, ts);
                }
            }),
            Slot::Flag(set) => coerce_flag(raw).map(|v| set(record, v)),
            Slot::Raw(set) => {
                set(record, raw.clone());
                Ok(())
            }
        };

        if let Err(kind) = outcome {
            self.report::<T>(spec.key, raw.clone(), kind);
        }
    }

    fn report<T: RecordShape>(&self, key: &str, raw: Value, kind: DiagnosticKind) {
        self.sink.report(Diagnostic::new(T::NAME, key, raw, kind));
    }
}

impl std::fmt::Debug for FieldMapper<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldMapper").finish_non_exhaustive()
    }
}

// ============================================================================
// Coercion rules, one per target kind
// ============================================================================

fn mismatch(expected: FieldKind) -> DiagnosticKind {
    DiagnosticKind::TypeMismatch { expected }
}

fn coerce_text(raw: &Value) -> Result<String, DiagnosticKind> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        _ => Err(mismatch(FieldKind::Text)),
    }
}

fn coerce_integer(raw: &Value) -> Result<i64, DiagnosticKind> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| mismatch(FieldKind::Integer)),
        Value::String(s) if s.is_empty() => Ok(0),
        Value::String(s) => s.parse::<i64>().map_err(|e| DiagnosticKind::Unparseable {
            reason: e.to_string(),
        }),
        _ => Err(mismatch(FieldKind::Integer)),
    }
}

fn coerce_decimal(raw: &Value) -> Result<f64, DiagnosticKind> {
    match raw {
        Value::Number(n) => n.as_f64().ok_or_else(|| mismatch(FieldKind::Decimal)),
        Value::String(s) if s.is_empty() => Ok(0.0),
        Value::String(s) => s.parse::<f64>().map_err(|e| DiagnosticKind::Unparseable {
            reason: e.to_string(),
        }),
        _ => Err(mismatch(FieldKind::Decimal)),
    }
}

/// `Ok(None)` for an empty string: no date, not a bad date
fn coerce_timestamp(raw: &Value) -> Result<Option<Timestamp>, DiagnosticKind> {
    match raw {
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => parse_timestamp(s)
            .map(Some)
            .map_err(DiagnosticKind::InvalidTimestamp),
        _ => Err(mismatch(FieldKind::Timestamp)),
    }
}

fn coerce_flag(raw: &Value) -> Result<bool, DiagnosticKind> {
    match raw {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" | "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            other => Err(DiagnosticKind::Unparseable {
                reason: format!("'{other}' is not a flag"),
            }),
        },
        _ => Err(mismatch(FieldKind::Flag)),
    }
}
