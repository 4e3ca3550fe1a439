//! Implementation of the `crewflow check` command.
//!
//! Loads and wires a flow exactly as `run` would, then prints the plan and
//! the inputs its task descriptions expect. Warnings (unknown tools, dropped
//! context references) surface through the log. Nothing is executed.

use super::Launcher;
use super::run::load_pipeline;
use crate::cli::CheckArgs;
use crate::error::{CrewError, Result};
use std::io::{self, Write};

pub fn cmd_check(launcher: &Launcher, args: CheckArgs) -> Result<()> {
    write_check(launcher, &args.flow, &mut io::stdout())
}

fn write_check<W: Write>(launcher: &Launcher, flow: &str, out: &mut W) -> Result<()> {
    let pipeline = load_pipeline(launcher, flow)?;
    let input_key = launcher.settings.input_key.as_str();

    let mut text = pipeline.render_plan();
    text.push_str("\n## Inputs\n\n");
    let placeholders = pipeline.placeholders();
    if placeholders.is_empty() {
        text.push_str("(none referenced)\n");
    }
    for name in &placeholders {
        let source = if name == input_key {
            "operator input"
        } else {
            "--set"
        };
        text.push_str(&format!("- {} ({})\n", name, source));
    }
    if !placeholders.contains(input_key) {
        tracing::warn!(
            flow,
            input_key,
            "no task description references the operator input"
        );
    }

    write!(out, "{}", text)
        .map_err(|e| CrewError::UserError(format!("console I/O failed: {}", e)))?;
    tracing::info!(flow, tasks = pipeline.tasks().len(), "flow is valid");
    Ok(())
}
