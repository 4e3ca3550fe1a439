//! Agent construction and lookup.
//!
//! # Lookup Order
//!
//! 1. Structural key (mapping key, or role / `a{index}` for list documents)
//! 2. Explicit `name` alias, unless it collides with a key
//! 3. Linear scan on `role`, first declared match wins

use super::pipeline::{Agent, AgentId};
use super::tools::CapabilityRegistry;
use crate::error::{CrewError, Result};
use crate::flow::{AgentSpec, Record};
use std::collections::HashMap;

/// Built agents plus the key/alias index used to resolve task references.
#[derive(Debug, Clone, Default)]
pub struct AgentRoster {
    agents: Vec<Agent>,
    index: HashMap<String, AgentId>,
}

impl AgentRoster {
    /// Resolve an agent reference from a task definition.
    pub fn resolve(&self, reference: &str) -> Option<AgentId> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        if let Some(id) = self.index.get(reference) {
            return Some(*id);
        }
        self.agents
            .iter()
            .position(|a| a.role == reference)
            .map(AgentId)
    }

    /// Comma-separated agent keys for error messages.
    pub fn available(&self) -> String {
        if self.agents.is_empty() {
            "(none)".to_string()
        } else {
            self.agents
                .iter()
                .map(|a| a.key.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    pub(crate) fn into_agents(self) -> Vec<Agent> {
        self.agents
    }
}

/// Build agents from their records.
///
/// Unknown tool names are dropped with a warning. Duplicate structural keys
/// are a configuration error.
pub fn build_agents(
    flow: &str,
    records: &[Record<AgentSpec>],
    registry: &CapabilityRegistry,
) -> Result<AgentRoster> {
    let mut roster = AgentRoster::default();

    for record in records {
        if roster.index.contains_key(&record.key) {
            return Err(CrewError::DuplicateKey {
                flow: flow.to_string(),
                kind: "agent",
                key: record.key.clone(),
            });
        }

        let spec = &record.spec;
        let mut tools = Vec::with_capacity(spec.tools.len());
        for tool_name in &spec.tools {
            match registry.resolve(tool_name) {
                Some(handle) if tools.contains(handle) => {}
                Some(handle) => tools.push(handle.clone()),
                None => tracing::warn!(
                    agent = %record.key,
                    tool = %tool_name,
                    known = %registry.names().collect::<Vec<_>>().join(", "),
                    "unknown tool; agent will run without it"
                ),
            }
        }

        let id = AgentId(roster.agents.len());
        roster.index.insert(record.key.clone(), id);
        roster.agents.push(Agent {
            key: record.key.clone(),
            name: spec.name.clone(),
            role: spec.role.clone(),
            goal: spec.goal.clone(),
            backstory: spec.backstory.clone(),
            llm: spec.llm.clone(),
            tools,
            allow_delegation: spec.allow_delegation,
            verbose: spec.verbose,
        });
    }

    // Aliases go in after every key so a key always wins.
    for (position, agent) in roster.agents.iter().enumerate() {
        let Some(alias) = agent.name.as_deref() else {
            continue;
        };
        let existing = roster.index.get(alias).copied();
        match existing {
            None => {
                roster.index.insert(alias.to_string(), AgentId(position));
            }
            Some(existing) if existing.0 == position => {}
            Some(existing) => tracing::warn!(
                agent = %agent.key,
                alias,
                taken_by = %roster.agents[existing.0].key,
                "agent name is already used as a lookup key; ignoring alias"
            ),
        }
    }

    tracing::debug!(flow, agents = roster.agents.len(), "built agents");
    Ok(roster)
}
