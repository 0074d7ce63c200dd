//! Tracing/logging setup shared by the gateway binaries.

pub mod tracing;

pub use self::tracing::LogFormat;

/// Initialize process-wide tracing, choosing the format from `LOG_FORMAT`.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    let format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|v| LogFormat::parse(&v))
        .unwrap_or_default();
    self::tracing::init(format);
}
