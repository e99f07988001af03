//! Opaque operation identifiers.

use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Number of random bytes behind every generated identifier (128 bits).
pub const OPERATION_ID_BYTES: usize = 16;

/// Opaque unique identifier assigned to an operation exactly once, at creation.
///
/// Generated identifiers are 128 bits drawn from the thread-local CSPRNG and
/// rendered as 32 lowercase hex characters. Identifiers read back from a
/// descriptor are accepted verbatim: the framework never parses them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; OPERATION_ID_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the identifier is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for OperationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for OperationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
