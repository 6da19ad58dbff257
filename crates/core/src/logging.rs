//! Structured logging infrastructure for QuorumVault.
//!
//! This module provides centralized logging initialization with support
//! for structured JSON output and environment-based configuration. Logs are
//! written to stderr so stdout stays free for command output.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system with structured output.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
/// If not set, defaults to `info` level.
///
/// # Example
/// ```no_run
/// use quorumvault_core::logging;
///
/// logging::init();
/// tracing::info!("Wallet started");
/// ```
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true).with_thread_ids(true))
        .init();
}

/// Initialize the logging system with JSON output for production environments.
///
/// # Example
/// ```no_run
/// use quorumvault_core::logging;
///
/// logging::init_json();
/// tracing::info!(wallet = "treasury", "Wallet started");
/// ```
pub fn init_json() {
    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(fmt::layer().json().with_writer(std::io::stderr).with_target(true).with_thread_ids(true))
        .init();
}

/// Initialize logging from the `[logging]` config section.
///
/// `RUST_LOG` still takes precedence over the configured level. Returns
/// `false` if a global subscriber was already installed.
pub fn init_from_config(config: &LoggingConfig) -> bool {
    let filter = env_filter(&config.level);
    match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true).with_thread_ids(true))
            .try_init()
            .is_ok(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr).with_target(true).with_thread_ids(true))
            .try_init()
            .is_ok(),
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
