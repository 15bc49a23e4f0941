//! Tracing and logging (shared setup).

/// Initialize process-wide logging.
///
/// The output format comes from `BIZOPS_LOG_FORMAT` (`json` or `pretty`,
/// default `json`). Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Tracing configuration (filters, layers).
pub mod tracing;
