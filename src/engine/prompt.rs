//! Prompt assembly for a single task.

use crate::crew::{Agent, ResolvedPipeline, Task};
use std::fmt::Write as _;

/// Build the prompt sent to the model for `task`.
///
/// `description` is the already-rendered task description; `upstream` holds
/// the outputs of completed context tasks in declared order.
pub fn build_prompt(
    pipeline: &ResolvedPipeline,
    task: &Task,
    description: &str,
    upstream: &[(&Task, &str)],
) -> String {
    let agent = pipeline.agent_for(task);
    let mut prompt = String::new();

    write_persona(&mut prompt, agent);

    if agent.allow_delegation {
        let colleagues: Vec<_> = pipeline
            .agents()
            .iter()
            .filter(|a| a.key != agent.key)
            .map(|a| a.role.as_str())
            .filter(|role| !role.is_empty())
            .collect();
        if !colleagues.is_empty() {
            let _ = writeln!(
                prompt,
                "You may ask these colleagues for help: {}.\n",
                colleagues.join(", ")
            );
        }
    }

    let _ = writeln!(prompt, "# Task\n\n{}\n", description.trim());

    if !task.expected_output.trim().is_empty() {
        let _ = writeln!(prompt, "# Expected output\n\n{}\n", task.expected_output.trim());
    }

    if !upstream.is_empty() {
        let _ = writeln!(prompt, "# Context from earlier tasks\n");
        for (source, output) in upstream {
            let _ = writeln!(prompt, "## {}\n\n{}\n", source.label(), output.trim());
        }
    }

    prompt.trim_end().to_string() + "\n"
}

fn write_persona(prompt: &mut String, agent: &Agent) {
    if !agent.role.is_empty() {
        let _ = writeln!(prompt, "You are {}.", agent.role);
    }
    if !agent.backstory.trim().is_empty() {
        let _ = writeln!(prompt, "{}", agent.backstory.trim());
    }
    if !agent.goal.trim().is_empty() {
        let _ = writeln!(prompt, "\nYour goal: {}", agent.goal.trim());
    }
    prompt.push('\n');

    if !agent.tools.is_empty() {
        let _ = writeln!(prompt, "Tools available to you:");
        for tool in &agent.tools {
            let _ = writeln!(prompt, "- {}: {}", tool.name, tool.description);
        }
        prompt.push('\n');
    }
}
