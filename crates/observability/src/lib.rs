//! Tracing/logging setup shared by binaries and tests.

/// Initialize process-wide logging from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    self::tracing::init_with(self::tracing::LogConfig::from_env());
}

pub use self::tracing::{LogConfig, LogFormat};

/// Subscriber configuration (filters, output format).
pub mod tracing;
