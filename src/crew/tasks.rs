//! Task construction in two passes.
//!
//! Context references may point forward in declaration order, so every task
//! is registered (pass 1) before any context list is resolved (pass 2).

use super::agents::AgentRoster;
use super::pipeline::{Task, TaskId};
use crate::error::{CrewError, Result};
use crate::flow::{Record, TaskSpec};
use std::collections::HashMap;

/// Build tasks against a roster.
///
/// An unresolvable agent reference aborts construction. Unresolvable or
/// self-referencing context entries are dropped with a warning.
pub fn build_tasks(
    flow: &str,
    records: &[Record<TaskSpec>],
    roster: &AgentRoster,
) -> Result<Vec<Task>> {
    let mut tasks = Vec::with_capacity(records.len());
    let mut registry: HashMap<&str, TaskId> = HashMap::new();

    // Pass 1: bind agents and register keys.
    for record in records {
        if registry.contains_key(record.key.as_str()) {
            return Err(CrewError::DuplicateKey {
                flow: flow.to_string(),
                kind: "task",
                key: record.key.clone(),
            });
        }

        let spec = &record.spec;
        let agent = roster
            .resolve(&spec.agent)
            .ok_or_else(|| CrewError::AgentNotFound {
                task: record.key.clone(),
                reference: spec.agent.clone(),
                available: roster.available(),
            })?;

        registry.insert(record.key.as_str(), TaskId(tasks.len()));
        tasks.push(Task {
            key: record.key.clone(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            expected_output: spec.expected_output.clone(),
            agent,
            context: Vec::new(),
            async_execution: spec.async_execution,
        });
    }

    // Names are aliases; a structural key always wins.
    for (position, record) in records.iter().enumerate() {
        let Some(name) = record.spec.name.as_deref() else {
            continue;
        };
        match registry.get(name).copied() {
            None => {
                registry.insert(name, TaskId(position));
            }
            Some(existing) if existing.0 == position => {}
            Some(existing) => tracing::warn!(
                task = %record.key,
                name,
                taken_by = %tasks[existing.0].key,
                "task name is already used as a lookup key; ignoring alias"
            ),
        }
    }

    // Pass 2: resolve context against the full registry.
    for (position, record) in records.iter().enumerate() {
        let mut context: Vec<TaskId> = Vec::with_capacity(record.spec.context.len());
        for reference in &record.spec.context {
            match registry.get(reference.trim()).copied() {
                Some(id) if id.0 == position => tracing::warn!(
                    task = %record.key,
                    "task lists itself as context; dropping reference"
                ),
                Some(id) if context.contains(&id) => {}
                Some(id) => context.push(id),
                None => tracing::warn!(
                    task = %record.key,
                    reference = %reference,
                    "context reference matches no task; dropping it"
                ),
            }
        }
        tasks[position].context = context;
    }

    tracing::debug!(flow, tasks = tasks.len(), "built tasks");
    Ok(tasks)
}
