//! Diagnostic logging.
//!
//! `tracing` events go to stderr so stdout stays free for menus and the
//! report path. Filter precedence, highest first:
//! 1. `CREWFLOW_LOG` environment variable (full `EnvFilter` syntax)
//! 2. `-q` / `-v` flags
//! 3. `logging.level` in settings

use crate::error::{CrewError, Result};
use crate::settings::{LogFormat, LoggingSettings};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable overriding the log filter.
pub const LOG_ENV: &str = "CREWFLOW_LOG";

/// Level implied by the command-line flags, falling back to `configured`.
pub fn effective_level(verbose: u8, quiet: bool, configured: &str) -> String {
    if quiet {
        return "error".to_string();
    }
    match verbose {
        0 => configured.trim().to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber. Call once, from `main`.
pub fn init_logging(settings: &LoggingSettings, verbose: u8, quiet: bool) -> Result<()> {
    let filter = build_env_filter(&effective_level(verbose, quiet, &settings.level))?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match settings.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    installed.map_err(|e| CrewError::Config(format!("failed to initialize logging: {}", e)))
}

fn build_env_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .map_err(|e| CrewError::Config(format!("invalid log level '{}': {}", level, e)))
}
