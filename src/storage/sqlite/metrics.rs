//! Metrics recording for the `SQLite` store.

use std::time::Instant;

/// Records operation metrics for a store operation.
///
/// Two series are recorded per call:
/// 1. `storage_operations_total` - counter by backend, operation and status
/// 2. `storage_operation_duration_ms` - latency histogram with the same labels
///
/// # Examples
///
/// ```ignore
/// use std::time::Instant;
/// use company_registry::storage::sqlite::record_operation_metrics;
///
/// let start = Instant::now();
/// // ... perform operation ...
/// record_operation_metrics("sqlite", "list", start, "success");
/// ```
pub fn record_operation_metrics(
    backend: &'static str,
    operation: &'static str,
    start: Instant,
    status: &'static str,
) {
    metrics::counter!(
        "storage_operations_total",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "storage_operation_duration_ms",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

/// Maps a result to the `status` label value.
pub const fn status_label<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() { "success" } else { "error" }
}
