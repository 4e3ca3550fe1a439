//! Implementation of the `crewflow run` command.
//!
//! # Steps
//!
//! 1. Pick the flow (`--flow` or numbered menu)
//! 2. Load and wire the flow, so a broken flow fails before any prompt
//! 3. Collect the operator text (`--input`, `--input-file` or console until
//!    EOF) and bind it, plus `--set` pairs, as template inputs
//! 4. Warn about placeholders with no input; append `run_started`, execute,
//!    save the report atomically
//! 5. Append `run_completed` or `run_failed`
//!
//! With `--dry-run` the plan is rendered to stdout; nothing is executed,
//! persisted or logged to the event log.

use super::Launcher;
use super::prompt::{build_inputs, read_operator_input, resolve_operator_text, select_flow};
use crate::cli::RunArgs;
use crate::crew::{CapabilityRegistry, ResolvedPipeline, build_pipeline};
use crate::engine::{CommandEngine, ExecutionEngine, Inputs, PlanEngine};
use crate::error::{CrewError, Result};
use crate::events::{Event, EventAction, append_event};
use crate::flow::{FlowDocuments, list_flows, validate_flow_name};
use crate::report::save_report;
use serde_json::json;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Wired flow and inputs for one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub pipeline: ResolvedPipeline,
    pub inputs: Inputs,
}

impl RunRequest {
    pub fn flow(&self) -> &str {
        self.pipeline.flow()
    }
}

/// Execute the `crewflow run` command against the process console.
pub fn cmd_run(launcher: &Launcher, args: RunArgs) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let request = prepare_run(launcher, &args, &mut input, &mut output)?;

    if args.dry_run {
        let plan = preview_flow(&request)?;
        print!("{}", plan);
        return Ok(());
    }

    let engine = CommandEngine::from_settings(&launcher.settings, launcher.home.clone());
    let report = run_flow(launcher, &request, &engine)?;
    println!("Report saved to {}", report.display());
    Ok(())
}

/// Pick and wire the flow, then resolve inputs from arguments or the console.
///
/// Operator input is only read once the flow has loaded and resolved.
pub fn prepare_run<R: BufRead, W: Write>(
    launcher: &Launcher,
    args: &RunArgs,
    input: &mut R,
    output: &mut W,
) -> Result<RunRequest> {
    let settings = &launcher.settings;

    let flow = match &args.flow {
        Some(flow) => validate_flow_name(flow)?.to_string(),
        None => {
            let config_root = launcher.config_root();
            let flows = list_flows(&config_root)?;
            if flows.is_empty() {
                return Err(CrewError::Config(format!(
                    "no flows found under '{}'",
                    config_root.display()
                )));
            }
            select_flow(&flows, input, output)?
        }
    };

    let pipeline = load_pipeline(launcher, &flow)?;

    let text = match (&args.input, &args.input_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map_err(|e| CrewError::io("failed to read input file", path, e))?,
        (None, None) => read_operator_input(&settings.input_key, input, output)?,
    };
    let text = resolve_operator_text(
        &text,
        settings.fallback_input.as_deref(),
        &settings.input_key,
    )?;

    Ok(RunRequest {
        pipeline,
        inputs: build_inputs(&settings.input_key, text, &args.set),
    })
}

/// Load and wire `flow` from the launcher's config root.
pub fn load_pipeline(launcher: &Launcher, flow: &str) -> Result<ResolvedPipeline> {
    let docs = FlowDocuments::load(&launcher.config_root(), flow)?;
    build_pipeline(&docs, &CapabilityRegistry::builtin())
}

/// Placeholders referenced by task descriptions that `inputs` does not bind.
pub fn missing_inputs(pipeline: &ResolvedPipeline, inputs: &Inputs) -> Vec<String> {
    let missing: Vec<String> = pipeline
        .placeholders()
        .into_iter()
        .filter(|name| !inputs.contains_key(name))
        .collect();
    for name in &missing {
        tracing::warn!(
            flow = pipeline.flow(),
            placeholder = %name,
            "task descriptions reference an input that was not provided"
        );
    }
    missing
}

/// Render the plan for `request` without executing anything.
pub fn preview_flow(request: &RunRequest) -> Result<String> {
    missing_inputs(&request.pipeline, &request.inputs);
    PlanEngine.execute(&request.pipeline, &request.inputs)
}

/// Run `request` through `engine` and persist the result.
///
/// Returns the path of the saved report. The outcome is recorded in the
/// flow's event log either way.
pub fn run_flow(
    launcher: &Launcher,
    request: &RunRequest,
    engine: &dyn ExecutionEngine,
) -> Result<PathBuf> {
    let flow = request.flow();
    missing_inputs(&request.pipeline, &request.inputs);

    let output_root = launcher.output_root();
    let input_names: Vec<&String> = request.inputs.keys().collect();
    append_event(
        &output_root,
        &Event::new(EventAction::RunStarted, flow).with_details(json!({ "inputs": input_names })),
    )?;

    match execute_and_persist(launcher, request, engine) {
        Ok(report) => {
            append_event(
                &output_root,
                &Event::new(EventAction::RunCompleted, flow).with_details(json!({
                    "report": report.display().to_string(),
                    "tasks": request.pipeline.tasks().len(),
                })),
            )?;
            Ok(report)
        }
        Err(err) => {
            let failed = Event::new(EventAction::RunFailed, flow).with_details(json!({
                "error": err.to_string(),
                "exit_code": err.exit_code(),
            }));
            if let Err(log_err) = append_event(&output_root, &failed) {
                tracing::warn!(error = %log_err, "failed to record run_failed event");
            }
            Err(err)
        }
    }
}

fn execute_and_persist(
    launcher: &Launcher,
    request: &RunRequest,
    engine: &dyn ExecutionEngine,
) -> Result<PathBuf> {
    let pipeline = &request.pipeline;
    tracing::info!(
        flow = pipeline.flow(),
        tasks = pipeline.tasks().len(),
        agents = pipeline.agents().len(),
        "running flow"
    );
    let text = engine.execute(pipeline, &request.inputs)?;

    save_report(&launcher.output_root(), pipeline.flow(), &text)
}
