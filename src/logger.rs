//! Log output setup.
//!
//! Everything in the crate logs through `tracing`; this installs the
//! subscriber that prints it. Output goes to stderr so that stdout stays clean
//! for data the CLI prints (data URLs, JSON listings).

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a stderr `fmt` subscriber.
///
/// `RUST_LOG` wins over `default_level` when set. Calling this more than once
/// (or after a test harness installed its own subscriber) is harmless.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
