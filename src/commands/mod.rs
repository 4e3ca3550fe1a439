//! Command implementations for crewflow.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, and the `Launcher` every command runs against.

mod check;
mod doctor;
mod list;
mod prompt;
mod run;

use crate::cli::{Command, RunArgs};
use crate::error::Result;
use crate::settings::Settings;
use std::path::PathBuf;

/// Resolved launcher home and its settings.
#[derive(Debug, Clone)]
pub struct Launcher {
    pub home: PathBuf,
    pub settings: Settings,
}

impl Launcher {
    pub fn new(home: PathBuf, settings: Settings) -> Self {
        Self { home, settings }
    }

    /// Directory holding one subdirectory per flow.
    pub fn config_root(&self) -> PathBuf {
        self.settings.config_root_in(&self.home)
    }

    /// Directory receiving reports and event logs.
    pub fn output_root(&self) -> PathBuf {
        self.settings.output_root_in(&self.home)
    }
}

/// Dispatch a command to its implementation.
///
/// No subcommand means the interactive launcher, which is `run` with every
/// value taken from the console.
pub fn dispatch(launcher: &Launcher, command: Option<Command>) -> Result<()> {
    match command {
        None => run::cmd_run(launcher, RunArgs::default()),
        Some(Command::Run(args)) => run::cmd_run(launcher, args),
        Some(Command::List) => list::cmd_list(launcher),
        Some(Command::Check(args)) => check::cmd_check(launcher, args),
        Some(Command::Doctor(args)) => doctor::cmd_doctor(launcher, args),
    }
}
