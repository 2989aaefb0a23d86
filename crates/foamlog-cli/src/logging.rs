//! Logging setup: `tracing` events from the core, formatted to stderr.
//!
//! `RUST_LOG` overrides the level picked from `-v` flags.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Map the number of `-v` flags to a level: warn, info, debug, then trace.
pub fn level_from_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

pub fn init(verbosity: u8) {
    let level = level_from_verbosity(verbosity).as_str().to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,foamlog={level},foamlog_core={level}"
        ))
    });

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .init();
}
