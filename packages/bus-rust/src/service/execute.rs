//! Uniform execution wrapper shared by every operation.
//!
//! Stamps `executed`/`returned` on the operation's metadata, emits the
//! start/finish log events through the injected [`Logger`], and records the
//! `commandment_operations_executed_total` counter and
//! `commandment_operation_duration_seconds` histogram. The business result is
//! passed back untouched.

use std::fmt;

use commandment_core::{ClockSource, Logger, OperationMetadata};
use tracing::info_span;

/// Run `business_logic` exactly once with lifecycle bookkeeping around it.
///
/// # Errors
///
/// Returns the error produced by `business_logic`, unmodified.
pub fn execute_operation<T, E, F>(
    operation_type: &'static str,
    metadata: &mut OperationMetadata,
    logger: &dyn Logger,
    clock: &dyn ClockSource,
    business_logic: F,
) -> Result<T, E>
where
    E: fmt::Display,
    F: FnOnce() -> Result<T, E>,
{
    let span = info_span!(
        "operation",
        operation_type = operation_type,
        operation_id = %metadata.id(),
    );
    let _entered = span.enter();

    metadata.mark_executed(clock.now());
    let operation_id = metadata.id().clone();
    logger.info(
        "Operation execution started",
        &[
            ("operation_type", &operation_type),
            ("operation_id", &operation_id),
        ],
    );

    let result = business_logic();

    metadata.mark_returned(clock.now());
    let elapsed = metadata.elapsed().unwrap_or_default();
    let duration_ms = elapsed.as_millis();

    let outcome = match &result {
        Ok(_) => {
            logger.info(
                "Operation execution completed",
                &[
                    ("operation_type", &operation_type),
                    ("operation_id", &operation_id),
                    ("duration_ms", &duration_ms),
                ],
            );
            "ok"
        }
        Err(err) => {
            logger.error(
                "Operation execution failed",
                &[
                    ("operation_type", &operation_type),
                    ("operation_id", &operation_id),
                    ("duration_ms", &duration_ms),
                    ("error", err),
                ],
            );
            "error"
        }
    };

    metrics::counter!(
        "commandment_operations_executed_total",
        "operation_type" => operation_type,
        "outcome" => outcome,
    )
    .increment(1);
    metrics::histogram!(
        "commandment_operation_duration_seconds",
        "operation_type" => operation_type,
    )
    .record(elapsed.as_secs_f64());

    result
}
