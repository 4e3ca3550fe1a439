//! Entity builder: turns flow documents into a resolved pipeline.
//!
//! - **Tools**: the capability registry agents draw their tools from
//! - **Agents**: agent construction and reference lookup
//! - **Tasks**: two-pass task construction and context wiring
//! - **Pipeline**: the resolved graph and its execution order
//!
//! The builder only wires references. Scheduling belongs to the execution
//! engine, which reads context edges and `async_execution` flags.

mod agents;
mod pipeline;
mod tasks;
mod tools;

#[cfg(test)]
mod tests;

pub use agents::build_agents;
pub use pipeline::{Agent, ResolvedPipeline, Task, TaskId};
pub use tasks::build_tasks;
pub use tools::CapabilityRegistry;

use crate::error::{CrewError, Result};
use crate::flow::FlowDocuments;

/// Build and check the pipeline for a loaded flow.
pub fn build_pipeline(
    docs: &FlowDocuments,
    registry: &CapabilityRegistry,
) -> Result<ResolvedPipeline> {
    if docs.tasks.is_empty() {
        return Err(CrewError::Config(format!(
            "flow '{}' declares no tasks",
            docs.flow
        )));
    }

    let roster = build_agents(&docs.flow, &docs.agents, registry)?;
    let tasks = build_tasks(&docs.flow, &docs.tasks, &roster)?;
    let pipeline = ResolvedPipeline::new(docs.flow.clone(), roster.into_agents(), tasks)?;

    tracing::info!(
        flow = %docs.flow,
        agents = pipeline.agents().len(),
        tasks = pipeline.tasks().len(),
        "pipeline resolved"
    );
    Ok(pipeline)
}
