//! CLI argument parsing for crewflow.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Crewflow: declarative launcher for role-based agent crews.
///
/// A flow is a directory holding `agents.yaml` and `tasks.yaml`. Crewflow
/// wires tasks to agents and to each other, runs them through the configured
/// engine, and saves the final text as a timestamped Markdown report.
///
/// Without a subcommand, crewflow lists the flows, asks which one to run and
/// reads the input text from the console.
#[derive(Parser, Debug)]
#[command(name = "crewflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Launcher home holding `crewflow.yaml`, `.env` and the config root.
    #[arg(long, global = true, env = "CREWFLOW_HOME", value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Settings file (default: `<home>/crewflow.yaml`).
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// More diagnostic output (repeatable).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands for crewflow.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a flow and save its report.
    ///
    /// Missing `--flow` or input fall back to console prompts.
    Run(RunArgs),

    /// List the flows under the config root.
    List,

    /// Load and wire a flow, then print its execution plan.
    ///
    /// Nothing is executed.
    Check(CheckArgs),

    /// Check provider credentials and the models each flow uses.
    ///
    /// Fails when a model some agent needs has no credential, or, with
    /// `--ping`, does not answer a one-line prompt.
    Doctor(DoctorArgs),
}

/// Arguments for the `run` command.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Flow to run. If omitted, choose from a numbered menu.
    #[arg(long)]
    pub flow: Option<String>,

    /// Input text. If omitted, read from the console until EOF.
    #[arg(long, conflicts_with = "input_file")]
    pub input: Option<String>,

    /// Read the input text from a file.
    #[arg(long, value_name = "PATH")]
    pub input_file: Option<PathBuf>,

    /// Extra template input (repeatable).
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub set: Vec<(String, String)>,

    /// Render the plan with inputs substituted instead of running the engine.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Flow to check.
    pub flow: String,
}

/// Arguments for the `doctor` command.
#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    /// Only check this flow's models (default: every flow).
    #[arg(long)]
    pub flow: Option<String>,

    /// Send one trivial prompt to each usable model through the engine.
    #[arg(long)]
    pub ping: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() || key.contains(['{', '}']) {
        return Err(format!("invalid input name '{}'", key));
    }
    Ok((key.to_string(), value.to_string()))
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
