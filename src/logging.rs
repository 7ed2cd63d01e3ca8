// 📜 Logging - tracing subscriber setup
//
// RUST_LOG controls the filter (default: info),
// e.g. RUST_LOG=port_ops=debug

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise logging for a binary. Call once, at startup.
/// Logs go to stderr so report output on stdout stays clean.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Verbose logging captured by the test harness; safe to call repeatedly
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
