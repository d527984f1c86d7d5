//! Logging initialization for the journal client.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber.
///
/// Log level comes from `RUST_LOG` when set, otherwise from the provided
/// default. Output goes to stderr so the CLI can keep stdout for data.
///
/// Safe to call more than once; subsequent calls are ignored.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
