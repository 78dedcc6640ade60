//! Process-wide tracing/logging setup.

/// Initialize logging with the filter from `RUST_LOG` (default `info`).
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Initialize logging with an explicit filter directive, e.g. the
/// `log_filter` from configuration.
pub fn init_with_filter(directive: &str) {
    tracing::init_with_filter(directive);
}

/// Human-readable output captured by the test harness.
pub fn init_for_tests() {
    tracing::init_for_tests();
}

pub mod tracing;
