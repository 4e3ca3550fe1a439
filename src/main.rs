//! Crewflow: declarative launcher for role-based agent crews.
//!
//! This is the main entry point for the `crewflow` CLI. It resolves the
//! launcher home, loads `.env` and settings, initializes logging, dispatches
//! to the command handler, and maps errors to exit codes.

mod cli;
mod commands;
mod credentials;
mod crew;
mod engine;
mod error;
mod events;
mod exit_codes;
mod flow;
mod fs;
mod logging;
mod report;
mod settings;

#[cfg(test)]
mod test_support;

use cli::Cli;
use commands::Launcher;
use error::{CrewError, Result};
use settings::{SETTINGS_FILE, Settings};
use std::error::Error as _;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match run(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            eprintln!("Error: {}", err);
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  Caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let home = match cli.home {
        Some(home) => home,
        None => std::env::current_dir()
            .map_err(|e| CrewError::io("failed to resolve current directory", ".", e))?,
    };

    let dotenv_path = home.join(".env");
    let dotenv = dotenvy::from_path(&dotenv_path);

    let settings_path = Settings::locate(cli.settings.as_deref(), &home);
    let settings = Settings::load_located(settings_path.as_deref())?;

    logging::init_logging(&settings.logging, cli.verbose, cli.quiet)?;
    match &settings_path {
        Some(path) => tracing::debug!(path = %path.display(), "loaded settings"),
        None => tracing::debug!(
            path = %home.join(SETTINGS_FILE).display(),
            "no settings file; using defaults"
        ),
    }
    match dotenv {
        Ok(()) => tracing::debug!(path = %dotenv_path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(path = %dotenv_path.display(), error = %e, "failed to load .env"),
    }
    tracing::debug!(home = %home.display(), "launcher home");

    let launcher = Launcher::new(absolute(home), settings);
    commands::dispatch(&launcher, cli.command)
}

fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}
