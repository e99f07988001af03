use std::time::Duration;

/// Bus-level configuration.
///
/// Controls the logging component label and the default deadline applied to
/// contexts built by the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// Component label attached to bus log events.
    pub component: String,
    /// Default deadline for [`OperationBus::execution_context`] in milliseconds.
    /// Zero disables the deadline.
    ///
    /// [`OperationBus::execution_context`]: crate::service::bus::OperationBus::execution_context
    pub default_operation_timeout_ms: u64,
}

impl BusConfig {
    /// The default operation timeout, or `None` when disabled.
    #[must_use]
    pub fn default_timeout(&self) -> Option<Duration> {
        (self.default_operation_timeout_ms > 0)
            .then(|| Duration::from_millis(self.default_operation_timeout_ms))
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            component: "operation-bus".to_string(),
            default_operation_timeout_ms: 30_000,
        }
    }
}
