//! Shared tracing setup for the service binary.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use self::tracing::LogFormat;

/// Initialize process-wide logging in the given format.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init(format: LogFormat) {
    tracing::init(format);
}

/// Initialize with the format named by `LOG_FORMAT`.
pub fn init_from_env() {
    init(LogFormat::from_env());
}
