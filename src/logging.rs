//! Tracing initialisation
//!
//! `RUST_LOG` wins over the configured level. Output goes to stderr so CLI
//! subcommands can print JSON on stdout.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level after applying `-v` flags on top of the configured one
pub fn effective_level(configured: &str, verbose: u8) -> &'static str {
    let base = match configured.to_ascii_lowercase().as_str() {
        "error" => 0,
        "warn" => 1,
        "info" => 2,
        "debug" => 3,
        "trace" => 4,
        _ => 2,
    };
    match (base + verbose as usize).min(4) {
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Safe to call more than once; later calls are no-ops.
pub fn init(config: &LoggingConfig, verbose: u8) {
    let level = effective_level(&config.level, verbose);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},taskguard={}", level, level)));

    let result = if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    };

    if result.is_ok() {
        tracing::debug!(level, json = config.json, "Tracing initialized");
    }
}
