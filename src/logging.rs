//! Tracing subscriber setup for the `dqa` binary.
//!
//! Logs go to stderr so that command output on stdout stays pipeable.
//! `RUST_LOG` takes precedence over `[logging].level`.

use std::io;

use anyhow::{anyhow, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| anyhow!("invalid logging.level '{}': {}", config.level, e))?;

    match config.format.as_str() {
        "json" => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_current_span(true)
                .with_target(true)
                .with_filter(env_filter);
            tracing_subscriber::registry()
                .with(layer)
                .try_init()
                .map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))?;
        }
        _ => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_filter(env_filter);
            tracing_subscriber::registry()
                .with(layer)
                .try_init()
                .map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))?;
        }
    }

    Ok(())
}
