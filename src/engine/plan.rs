//! Dry-run engine: renders what would run without running it.

use super::template::render_template;
use super::{ExecutionEngine, Inputs};
use crate::crew::ResolvedPipeline;
use crate::error::{CrewError, Result};
use std::fmt::Write as _;

/// Produces a Markdown plan with every description rendered against the
/// inputs, so placeholder mistakes surface without spending model calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanEngine;

impl ExecutionEngine for PlanEngine {
    fn execute(&self, pipeline: &ResolvedPipeline, inputs: &Inputs) -> Result<String> {
        let mut out = pipeline.render_plan();

        let _ = writeln!(out, "\n## Inputs\n");
        if inputs.is_empty() {
            out.push_str("(none)\n");
        }
        for (name, value) in inputs {
            let _ = writeln!(out, "- **{}**: {}", name, value.lines().next().unwrap_or(""));
        }

        let _ = writeln!(out, "\n## Rendered descriptions");
        for id in pipeline.execution_order() {
            let task = pipeline.task(*id);
            let description =
                render_template(&task.description, inputs).map_err(|source| {
                    CrewError::Template {
                        context: format!("description of task '{}'", task.key),
                        source,
                    }
                })?;
            let _ = writeln!(out, "\n### {}\n\n{}", task.label(), description.trim());
        }
        Ok(out)
    }
}
