//! Structured logger contract consumed by the operation framework.
//!
//! The framework never talks to a logging backend directly: every event goes
//! through a [`Logger`] injected into the bus and shared with each operation.
//! Implementations are fire-and-forget and must not panic.

use std::fmt;

use parking_lot::Mutex;
use tracing::Level;

/// A single structured field: static key, displayable value.
pub type Field<'a> = (&'static str, &'a dyn fmt::Display);

/// Structured logging sink.
pub trait Logger: Send + Sync {
    /// Emit `message` at `level` with structured `fields`.
    fn log(&self, level: Level, message: &str, fields: &[Field<'_>]);

    fn debug(&self, message: &str, fields: &[Field<'_>]) {
        self.log(Level::DEBUG, message, fields);
    }

    fn info(&self, message: &str, fields: &[Field<'_>]) {
        self.log(Level::INFO, message, fields);
    }

    fn warn(&self, message: &str, fields: &[Field<'_>]) {
        self.log(Level::WARN, message, fields);
    }

    fn error(&self, message: &str, fields: &[Field<'_>]) {
        self.log(Level::ERROR, message, fields);
    }
}

/// Renders fields as `key=value` pairs separated by spaces.
pub struct DisplayFields<'a>(pub &'a [Field<'a>]);

impl fmt::Display for DisplayFields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TracingLogger
// ---------------------------------------------------------------------------

/// Forwards every event to `tracing` under the `commandment` target.
///
/// The `component` label is attached to every event so several buses in one
/// process can be told apart.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: String,
}

impl TracingLogger {
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new("operation-bus")
    }
}

/// Keys emitted as first-class `tracing` fields instead of inside `fields`.
const PROMOTED_FIELDS: [&str; 5] = [
    "operation_type",
    "operation_id",
    "service_type",
    "duration_ms",
    "error",
];

fn promoted(fields: &[Field<'_>], key: &str) -> Option<String> {
    fields
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
}

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str, fields: &[Field<'_>]) {
        let component = self.component.as_str();
        let operation_type = promoted(fields, "operation_type");
        let operation_id = promoted(fields, "operation_id");
        let service_type = promoted(fields, "service_type");
        let duration_ms = promoted(fields, "duration_ms").and_then(|v| v.parse::<u64>().ok());
        let error = promoted(fields, "error");
        let rest: Vec<Field<'_>> = fields
            .iter()
            .copied()
            .filter(|(k, _)| !PROMOTED_FIELDS.contains(k))
            .collect();
        let rest = DisplayFields(&rest);

        macro_rules! emit {
            ($event:ident) => {
                tracing::$event!(
                    target: "commandment",
                    component,
                    operation_type = operation_type.as_deref(),
                    operation_id = operation_id.as_deref(),
                    service_type = service_type.as_deref(),
                    duration_ms,
                    error = error.as_deref(),
                    fields = %rest,
                    "{message}"
                )
            };
        }

        match level {
            Level::ERROR => emit!(error),
            Level::WARN => emit!(warn),
            Level::INFO => emit!(info),
            Level::DEBUG => emit!(debug),
            _ => emit!(trace),
        }
    }
}

// ---------------------------------------------------------------------------
// NullLogger
// ---------------------------------------------------------------------------

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: Level, _message: &str, _fields: &[Field<'_>]) {}
}

// ---------------------------------------------------------------------------
// RecordingLogger
// ---------------------------------------------------------------------------

/// One captured event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogRecord {
    /// Value of the first field named `key`, rendered as a string.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingLogger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured events.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Captured events whose message equals `message`.
    #[must_use]
    pub fn with_message(&self, message: &str) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.message == message)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: Level, message: &str, fields: &[Field<'_>]) {
        let record = LogRecord {
            level,
            message: message.to_string(),
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
        };
        self.records.lock().push(record);
    }
}
