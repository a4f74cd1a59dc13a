//! Logging setup for the CLI
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! binary's job. Output goes to stderr so stdout stays clean for command
//! results.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber
///
/// `RUST_LOG` wins over `level` when set. Returns `false` if a subscriber
/// was already installed.
pub fn init_logging(level: &str, json: bool) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    if json {
        builder.json().with_target(true).try_init().is_ok()
    } else {
        builder.with_target(false).try_init().is_ok()
    }
}
