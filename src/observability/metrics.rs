//! Per-operation metrics.
//!
//! Emitted through the `metrics` facade; with no recorder installed the
//! macros are no-ops, so the harness decides whether to export them.

use crate::models::{Operation, Status};
use std::time::Duration;

/// Counter of completed operations, labelled by operation and status.
pub const OPERATIONS_TOTAL: &str = "graphkv_operations_total";
/// Histogram of operation latency in seconds, labelled by operation.
pub const OPERATION_DURATION: &str = "graphkv_operation_duration_seconds";
/// Gauge of clients sharing the connection.
pub const ACTIVE_CLIENTS: &str = "graphkv_active_clients";

/// Records the outcome and latency of one harness operation.
pub fn record_operation(operation: Operation, status: Status, elapsed: Duration) {
    metrics::counter!(
        OPERATIONS_TOTAL,
        "operation" => operation.as_str(),
        "status" => status.as_str()
    )
    .increment(1);
    metrics::histogram!(OPERATION_DURATION, "operation" => operation.as_str())
        .record(elapsed.as_secs_f64());
}

/// Publishes the number of clients holding the shared connection.
#[allow(clippy::cast_precision_loss)]
pub fn record_active_clients(count: usize) {
    metrics::gauge!(ACTIVE_CLIENTS).set(count as f64);
}
