//! Command-driven execution engine.
//!
//! Each task becomes one invocation of the configured command template. The
//! rendered prompt is written to stdin and stdout is taken as the task's
//! output. Template variables available to the command:
//!
//! - `{model}` - model reference of the task's agent (or the default model)
//! - `{provider}` - provider id of the model reference (empty if none)
//! - `{agent}` / `{role}` - agent key and role
//! - `{task}` - task key
//! - `{tools}` - comma-separated tool names
//! - `{api_key_env}` - credential variable name for the provider (empty if none)
//!
//! The resolved credential value is exported as `CREWFLOW_API_KEY`.

use super::process::{ProcessOutput, run_command};
use super::prompt::build_prompt;
use super::template::{Variables, render_template, vars};
use super::{ExecutionEngine, Inputs};
use crate::credentials::{ProviderRoutes, provider_of};
use crate::crew::{ResolvedPipeline, Task, TaskId};
use crate::error::{CrewError, Result};
use crate::settings::{EngineSettings, Settings};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

/// Environment variable carrying the resolved provider credential.
pub const API_KEY_ENV: &str = "CREWFLOW_API_KEY";

const PING_PROMPT: &str = "Reply with the single word 'Works' and the name of your model.";

/// Runs tasks through an external command.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    engine: EngineSettings,
    routes: ProviderRoutes,
    default_model: Option<String>,
    workdir: PathBuf,
}

impl CommandEngine {
    pub fn new(
        engine: EngineSettings,
        routes: ProviderRoutes,
        default_model: Option<String>,
        workdir: PathBuf,
    ) -> Self {
        Self {
            engine,
            routes,
            default_model,
            workdir,
        }
    }

    /// Engine configured from launcher settings, running commands in `workdir`.
    pub fn from_settings(settings: &Settings, workdir: PathBuf) -> Self {
        Self::new(
            settings.engine.clone(),
            ProviderRoutes::new(settings.providers.clone()),
            settings.default_model.clone(),
            workdir,
        )
    }

    fn run_task(
        &self,
        pipeline: &ResolvedPipeline,
        id: TaskId,
        inputs: &Inputs,
        outputs: &[Option<String>],
    ) -> Result<String> {
        let task = pipeline.task(id);
        let agent = pipeline.agent_for(task);

        let description =
            render_template(&task.description, inputs).map_err(|source| CrewError::Template {
                context: format!("description of task '{}'", task.key),
                source,
            })?;

        let upstream: Vec<(&Task, &str)> = task
            .context
            .iter()
            .filter_map(|c| {
                outputs[c.index()]
                    .as_deref()
                    .map(|output| (pipeline.task(*c), output))
            })
            .collect();
        let prompt = build_prompt(pipeline, task, &description, &upstream);

        let model = agent
            .llm
            .as_deref()
            .or(self.default_model.as_deref())
            .ok_or_else(|| {
                CrewError::Engine(format!(
                    "agent '{}' has no llm and no default_model is configured",
                    agent.key
                ))
            })?;

        if agent.verbose {
            tracing::info!(task = %task.key, agent = %agent.key, model, "running task");
        } else {
            tracing::debug!(task = %task.key, agent = %agent.key, model, "running task");
        }
        tracing::trace!(task = %task.key, prompt = %prompt, "task prompt");

        let tools: Vec<_> = agent.tools.iter().map(|t| t.name.as_str()).collect();
        let variables = vars([
            ("agent", agent.key.clone()),
            ("role", agent.role.clone()),
            ("task", task.key.clone()),
            ("tools", tools.join(",")),
        ]);
        let output = self.invoke(&format!("task '{}'", task.key), model, variables, &prompt)?;

        tracing::info!(
            task = %task.key,
            elapsed_ms = output.duration.as_millis() as u64,
            bytes = output.stdout.len(),
            "task complete"
        );
        Ok(output.stdout.trim_end().to_string())
    }

    /// Send a one-line prompt to `model` through the engine command.
    ///
    /// Used by `crewflow doctor --ping` to confirm a model is reachable with
    /// the configured credential. Returns the trimmed reply.
    pub fn ping(&self, model: &str) -> Result<String> {
        let variables = vars([("agent", ""), ("role", ""), ("task", "ping"), ("tools", "")]);
        let output = self.invoke(
            &format!("connectivity check for '{}'", model),
            model,
            variables,
            PING_PROMPT,
        )?;
        Ok(output.stdout.trim().to_string())
    }

    /// Run the engine command for `model` with `prompt` on stdin.
    ///
    /// Adds `{model}`, `{provider}` and `{api_key_env}` to `variables` and
    /// exports the resolved credential. `label` names the call in errors.
    fn invoke(
        &self,
        label: &str,
        model: &str,
        mut variables: Variables,
        prompt: &str,
    ) -> Result<ProcessOutput> {
        let mut environment = self.engine.environment.clone();
        if let Some(credential) = self.routes.resolve(model) {
            environment.insert(API_KEY_ENV.to_string(), credential.value);
        }

        variables.extend(vars([
            ("model", model),
            ("provider", provider_of(model).unwrap_or_default()),
            ("api_key_env", self.routes.variable_for(model).unwrap_or_default()),
        ]));
        let command =
            render_template(&self.engine.command, &variables).map_err(|source| {
                CrewError::Template {
                    context: "engine command".to_string(),
                    source,
                }
            })?;

        let output = run_command(
            &command,
            prompt,
            &environment,
            &self.workdir,
            Duration::from_secs(self.engine.timeout_seconds),
        )?;

        if output.timed_out {
            return Err(CrewError::Engine(format!(
                "{} timed out after {}s",
                label, self.engine.timeout_seconds
            )));
        }
        if !output.is_success() {
            return Err(CrewError::Engine(format!(
                "{} command exited with {}: {}",
                label,
                output
                    .exit_code
                    .map_or_else(|| "a signal".to_string(), |code| format!("status {}", code)),
                last_lines(&output.stderr, 5)
            )));
        }
        Ok(output)
    }
}

impl ExecutionEngine for CommandEngine {
    fn execute(&self, pipeline: &ResolvedPipeline, inputs: &Inputs) -> Result<String> {
        let order = pipeline.execution_order();
        let mut outputs: Vec<Option<String>> = vec![None; pipeline.tasks().len()];

        let mut cursor = 0;
        while cursor < order.len() {
            let batch = next_batch(pipeline, &order[cursor..]);
            cursor += batch.len();

            if let [id] = batch {
                let output = self.run_task(pipeline, *id, inputs, &outputs)?;
                outputs[id.index()] = Some(output);
                continue;
            }

            tracing::debug!(tasks = batch.len(), "running async group");
            let snapshot = &outputs;
            let results: Vec<(TaskId, Result<String>)> = thread::scope(|scope| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|id| {
                        let id = *id;
                        (
                            id,
                            scope.spawn(move || self.run_task(pipeline, id, inputs, snapshot)),
                        )
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|(id, handle)| {
                        let result = handle.join().unwrap_or_else(|_| {
                            Err(CrewError::Engine(format!(
                                "task '{}' panicked",
                                pipeline.task(id).key
                            )))
                        });
                        (id, result)
                    })
                    .collect()
            });

            for (id, result) in results {
                outputs[id.index()] = Some(result?);
            }
        }

        order
            .last()
            .and_then(|id| outputs[id.index()].take())
            .ok_or_else(|| CrewError::Engine("pipeline produced no output".to_string()))
    }
}

/// Next group of tasks that may run together.
///
/// A non-async task runs alone. An async task is grouped with the async tasks
/// directly after it in execution order, stopping at the first task that is
/// not async or that depends on a member of the group.
fn next_batch<'a>(pipeline: &ResolvedPipeline, remaining: &'a [TaskId]) -> &'a [TaskId] {
    let Some(first) = remaining.first() else {
        return remaining;
    };
    if !pipeline.task(*first).async_execution {
        return &remaining[..1];
    }

    let mut end = 1;
    while end < remaining.len() {
        let candidate = pipeline.task(remaining[end]);
        let depends_on_group = candidate
            .context
            .iter()
            .any(|c| remaining[..end].contains(c));
        if !candidate.async_execution || depends_on_group {
            break;
        }
        end += 1;
    }
    &remaining[..end]
}

fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<_> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(count);
    let tail = lines[start..].join("\n");
    if tail.is_empty() {
        "(no stderr)".to_string()
    } else {
        tail
    }
}
