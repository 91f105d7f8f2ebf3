//! Decode diagnostics and the sinks that receive them

use super::types::FieldKind;
use crate::temporal::TimestampError;
use serde_json::Value;
use std::fmt;
use std::sync::Mutex;
use tracing::{debug, warn};

/// What went wrong with a single field or row
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    /// The source key is absent from the payload
    MissingKey,
    /// The raw value has a JSON type the target kind does not accept
    TypeMismatch { expected: FieldKind },
    /// Text that should have held a number or flag did not parse
    Unparseable { reason: String },
    /// Text that should have held a date did not parse
    InvalidTimestamp(TimestampError),
    /// A page entry or nested entry is not a JSON object
    MalformedRow,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::MissingKey => write!(f, "key not found"),
            DiagnosticKind::TypeMismatch { expected } => {
                write!(f, "value cannot be coerced to {expected}")
            }
            DiagnosticKind::Unparseable { reason } => write!(f, "unparseable value: {reason}"),
            DiagnosticKind::InvalidTimestamp(err) => write!(f, "{err}"),
            DiagnosticKind::MalformedRow => write!(f, "entry is not an object"),
        }
    }
}

/// A field was left at its zero value, or a row was skipped
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Record type being decoded
    pub shape: &'static str,
    /// Source key (or row key for row-level diagnostics)
    pub key: String,
    /// Offending raw value (`null` when absent)
    pub raw: Value,
    /// Reason
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// Create a diagnostic
    pub fn new(
        shape: &'static str,
        key: impl Into<String>,
        raw: Value,
        kind: DiagnosticKind,
    ) -> Self {
        Self {
            shape,
            key: key.into(),
            raw,
            kind,
        }
    }

    /// Absent keys are expected noise; everything else is a warning
    pub fn is_warning(&self) -> bool {
        !matches!(self.kind, DiagnosticKind::MissingKey)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {} (raw: {})", self.shape, self.key, self.kind, self.raw)
    }
}

/// Receiver of decode diagnostics
pub trait DiagnosticSink: Send + Sync {
    /// Record one diagnostic
    fn report(&self, diagnostic: Diagnostic);
}

/// Emits diagnostics as structured `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        let Diagnostic {
            shape,
            key,
            raw,
            kind,
        } = &diagnostic;

        if diagnostic.is_warning() {
            warn!(shape, key = %key, raw = %raw, reason = %kind, "field decode skipped");
        } else {
            debug!(shape, key = %key, "key not found in payload");
        }
    }
}

/// Collects diagnostics in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    /// Only the warnings (absent keys filtered out)
    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.lock()
            .iter()
            .filter(|d| d.is_warning())
            .cloned()
            .collect()
    }

    /// Drain all collected diagnostics
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of collected diagnostics
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been reported
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Diagnostic>> {
        // A poisoned lock still holds valid diagnostics
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, diagnostic: Diagnostic) {
        self.lock().push(diagnostic);
    }
}
