//! Tracing subscriber setup for binaries.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this a
/// second time is an error from the subscriber registry.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr).pretty())
            .try_init()?,
        LogFormat::Compact => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .compact()
                    .with_target(false),
            )
            .try_init()?,
    }

    Ok(())
}
