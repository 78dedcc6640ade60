//! Subscriber construction.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    install_json(filter);
}

pub fn init_with_filter(directive: &str) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|err| {
        eprintln!("invalid log filter '{directive}' ({err}); falling back to '{DEFAULT_DIRECTIVE}'");
        EnvFilter::new(DEFAULT_DIRECTIVE)
    });
    install_json(filter);
}

pub fn init_for_tests() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// JSON lines with timestamps; the target is dropped to keep lines short.
fn install_json(filter: EnvFilter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
