//! The resolved object graph handed to an execution engine.
//!
//! Agents and tasks live in arenas owned by the pipeline; references between
//! them are typed indices (`AgentId`, `TaskId`).

use super::tools::ToolHandle;
use crate::error::{CrewError, Result};
use regex::Regex;
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};
use std::fmt::Write as _;
use std::sync::LazyLock;

/// Matches `{{`, `}}` and `{name}`; only the last form captures.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{|\}\}|\{([^{}]*)\}").expect("placeholder regex is valid"));

/// Handle to an agent within one pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub(crate) usize);

/// Handle to a task within one pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) usize);

impl TaskId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A built agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub key: String,
    pub name: Option<String>,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    /// Model reference; `None` means the engine default.
    pub llm: Option<String>,
    pub tools: Vec<ToolHandle>,
    pub allow_delegation: bool,
    pub verbose: bool,
}

/// A built task with resolved agent and context handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub key: String,
    pub name: Option<String>,
    pub description: String,
    pub expected_output: String,
    pub agent: AgentId,
    pub context: Vec<TaskId>,
    pub async_execution: bool,
}

impl Task {
    /// Name if declared, else the structural key.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.key)
    }
}

/// Agents and tasks of one flow, wired and checked.
#[derive(Debug, Clone)]
pub struct ResolvedPipeline {
    flow: String,
    agents: Vec<Agent>,
    tasks: Vec<Task>,
    order: Vec<TaskId>,
}

impl ResolvedPipeline {
    /// Assemble a pipeline, rejecting context cycles.
    pub(crate) fn new(flow: String, agents: Vec<Agent>, tasks: Vec<Task>) -> Result<Self> {
        let order = topological_order(&tasks)?;
        Ok(Self {
            flow,
            agents,
            tasks,
            order,
        })
    }

    pub fn flow(&self) -> &str {
        &self.flow
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Tasks in declaration order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn agent(&self, id: AgentId) -> &Agent {
        &self.agents[id.0]
    }

    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id.0]
    }

    /// The agent bound to `task`.
    pub fn agent_for(&self, task: &Task) -> &Agent {
        self.agent(task.agent)
    }

    /// Find a task by structural key.
    #[cfg(test)]
    pub fn find_task(&self, key: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.key == key)
    }

    /// Upstream tasks of `task`, in declared order.
    pub fn context_of<'a>(&'a self, task: &'a Task) -> impl Iterator<Item = &'a Task> + 'a {
        task.context.iter().map(|id| self.task(*id))
    }

    /// Deterministic dependency-respecting order.
    ///
    /// Every task appears after all of its context tasks; among tasks that are
    /// ready at the same time, the earlier-declared one comes first. A flow
    /// declared in dependency order runs in declaration order.
    pub fn execution_order(&self) -> &[TaskId] {
        &self.order
    }

    /// Placeholder names referenced by task descriptions, sorted.
    pub fn placeholders(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for task in &self.tasks {
            for caps in PLACEHOLDER.captures_iter(&task.description) {
                if let Some(name) = caps.get(1) {
                    let name = name.as_str().trim();
                    if !name.is_empty() {
                        names.insert(name.to_string());
                    }
                }
            }
        }
        names
    }

    /// Markdown summary of agents and tasks in execution order.
    pub fn render_plan(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Plan: {}\n", self.flow);

        let _ = writeln!(out, "## Agents\n");
        for agent in &self.agents {
            let tools: Vec<_> = agent.tools.iter().map(|t| t.name.as_str()).collect();
            let _ = writeln!(
                out,
                "- **{}** ({}) model: {}, tools: {}",
                agent.key,
                agent.role,
                agent.llm.as_deref().unwrap_or("default"),
                if tools.is_empty() {
                    "none".to_string()
                } else {
                    tools.join(", ")
                }
            );
        }

        let _ = writeln!(out, "\n## Tasks (execution order)\n");
        for (position, id) in self.order.iter().enumerate() {
            let task = self.task(*id);
            let agent = self.agent_for(task);
            let _ = write!(out, "{}. **{}** -> {}", position + 1, task.label(), agent.key);
            if task.async_execution {
                out.push_str(" [async]");
            }
            out.push('\n');
            if !task.context.is_empty() {
                let context: Vec<_> = self.context_of(task).map(Task::label).collect();
                let _ = writeln!(out, "   context: {}", context.join(", "));
            }
        }
        out
    }
}

/// Kahn's algorithm with declaration index as the tie-break.
fn topological_order(tasks: &[Task]) -> Result<Vec<TaskId>> {
    let mut pending: Vec<usize> = tasks.iter().map(|t| t.context.len()).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    for (index, task) in tasks.iter().enumerate() {
        for upstream in &task.context {
            dependents[upstream.0].push(index);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = pending
        .iter()
        .enumerate()
        .filter(|(_, count)| **count == 0)
        .map(|(index, _)| Reverse(index))
        .collect();

    let mut order = Vec::with_capacity(tasks.len());
    while let Some(Reverse(index)) = ready.pop() {
        order.push(TaskId(index));
        for &dependent in &dependents[index] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    if order.len() == tasks.len() {
        Ok(order)
    } else {
        Err(CrewError::ContextCycle {
            tasks: find_cycle(tasks, &pending),
        })
    }
}

/// Walk unmet context edges from the first blocked task until a task repeats.
///
/// Every blocked task has at least one blocked upstream task, so the walk
/// always closes a loop.
fn find_cycle(tasks: &[Task], pending: &[usize]) -> Vec<String> {
    let blocked = |index: usize| pending[index] > 0;
    let Some(start) = (0..tasks.len()).find(|&i| blocked(i)) else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut current = start;
    loop {
        let Some(next) = tasks[current]
            .context
            .iter()
            .map(|id| id.0)
            .find(|&i| blocked(i))
        else {
            break;
        };
        if let Some(pos) = path.iter().position(|&i| i == next) {
            let mut cycle: Vec<String> = path[pos..].iter().map(|&i| tasks[i].key.clone()).collect();
            cycle.push(tasks[next].key.clone());
            return cycle;
        }
        path.push(next);
        current = next;
    }
    path.iter().map(|&i| tasks[i].key.clone()).collect()
}
