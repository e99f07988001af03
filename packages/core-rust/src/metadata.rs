//! Audit metadata carried by every operation instance.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::ClockSource;
use crate::id::OperationId;

/// Identifier and lifecycle timestamps of a single operation.
///
/// `id` and `created` are fixed at construction. `executed` and `returned` are
/// stamped by the execution wrapper; the stamping methods clamp each stamp so
/// that `created <= executed <= returned` holds even if the clock steps back.
///
/// Wire form (JSON field names are part of the descriptor contract):
/// `{"id", "created", "executed"?, "returned"?}` with RFC 3339 timestamps and
/// unset stamps omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationMetadata {
    id: OperationId,
    created: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    executed: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    returned: Option<DateTime<Utc>>,
}

impl OperationMetadata {
    /// Metadata for an operation that has not run yet.
    #[must_use]
    pub fn new(id: OperationId, created: DateTime<Utc>) -> Self {
        Self {
            id,
            created,
            executed: None,
            returned: None,
        }
    }

    /// Fresh metadata: a newly generated id and `created` read from `clock`.
    #[must_use]
    pub fn fresh(clock: &dyn ClockSource) -> Self {
        Self::new(OperationId::generate(), clock.now())
    }

    #[must_use]
    pub fn id(&self) -> &OperationId {
        &self.id
    }

    #[must_use]
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    #[must_use]
    pub fn executed(&self) -> Option<DateTime<Utc>> {
        self.executed
    }

    #[must_use]
    pub fn returned(&self) -> Option<DateTime<Utc>> {
        self.returned
    }

    /// Returns true once an execution has started.
    #[must_use]
    pub fn has_executed(&self) -> bool {
        self.executed.is_some()
    }

    /// Stamp the start of an execution and return the recorded instant.
    ///
    /// Clears any previous `returned` stamp.
    pub fn mark_executed(&mut self, at: DateTime<Utc>) -> DateTime<Utc> {
        let at = at.max(self.created);
        self.executed = Some(at);
        self.returned = None;
        at
    }

    /// Stamp the end of an execution and return the recorded instant.
    pub fn mark_returned(&mut self, at: DateTime<Utc>) -> DateTime<Utc> {
        let floor = self.executed.unwrap_or(self.created);
        let at = at.max(floor);
        self.returned = Some(at);
        at
    }

    /// `returned - executed`, once both are stamped.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        match (self.executed, self.returned) {
            (Some(executed), Some(returned)) => Some(returned - executed),
            _ => None,
        }
    }

    /// [`duration`](Self::duration) as a `std::time::Duration`.
    #[must_use]
    pub fn elapsed(&self) -> Option<std::time::Duration> {
        self.duration().and_then(|d| d.to_std().ok())
    }

    /// Copy that keeps `id` and `created` but drops the execution stamps.
    ///
    /// Used when a described operation is reconstructed: running it again is a
    /// new execution of the same intent.
    #[must_use]
    pub fn for_replay(&self) -> Self {
        Self::new(self.id.clone(), self.created)
    }
}
