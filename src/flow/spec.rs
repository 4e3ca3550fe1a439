//! Definition schemas for agent and task documents.
//!
//! # Agent document
//!
//! ```yaml
//! reviewer:
//!   role: "Reviewer"
//!   goal: "Find defects in the draft"
//!   backstory: "A meticulous editor."
//!   llm: "gemini/gemini-1.5-pro"
//!   tools: [web_search]
//!   name: critic            # optional alternate lookup key
//! ```
//!
//! # Task document
//!
//! ```yaml
//! review:
//!   description: "Review this text: {business_description}"
//!   expected_output: "A list of issues"
//!   agent: reviewer          # key, alias, or role
//!   context: [draft]         # upstream task keys or names
//!   async_execution: false
//! ```
//!
//! Unknown fields are ignored so documents written for other launchers still
//! load.

use super::document::DocumentEntry;
use serde::{Deserialize, Deserializer, Serialize};

/// One worker role as declared in `agents.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Display identity; also used as a fallback lookup key.
    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub goal: String,

    /// Persona instructions.
    #[serde(default)]
    pub backstory: String,

    /// Model reference, e.g. `groq/llama-3.1-70b`.
    #[serde(default, alias = "model", skip_serializing_if = "Option::is_none")]
    pub llm: Option<String>,

    /// Capability names, resolved against the tool registry.
    #[serde(default, deserialize_with = "one_or_many")]
    pub tools: Vec<String>,

    #[serde(default)]
    pub allow_delegation: bool,

    #[serde(default = "default_true")]
    pub verbose: bool,

    /// Alternate lookup key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Default for AgentSpec {
    fn default() -> Self {
        Self {
            role: String::new(),
            goal: String::new(),
            backstory: String::new(),
            llm: None,
            tools: Vec::new(),
            allow_delegation: false,
            verbose: default_true(),
            name: None,
        }
    }
}

impl DocumentEntry for AgentSpec {
    const KIND: &'static str = "agent";

    /// List-shaped agent documents are keyed by role, or `a{index}` without one.
    fn list_key(&self, index: usize) -> String {
        if self.role.trim().is_empty() {
            format!("a{}", index)
        } else {
            self.role.clone()
        }
    }
}

/// One unit of work as declared in `tasks.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Alternate lookup key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Work description; may contain `{placeholder}` tokens.
    #[serde(default)]
    pub description: String,

    /// Informational output contract.
    #[serde(default)]
    pub expected_output: String,

    /// Agent reference: key, alias, or role.
    #[serde(default)]
    pub agent: String,

    /// Upstream task references.
    #[serde(default, deserialize_with = "one_or_many")]
    pub context: Vec<String>,

    /// Hint that the task may run alongside independent siblings.
    #[serde(default, alias = "async")]
    pub async_execution: bool,
}

impl DocumentEntry for TaskSpec {
    const KIND: &'static str = "task";

    fn list_key(&self, index: usize) -> String {
        format!("task_{}", index)
    }
}

fn default_true() -> bool {
    true
}

/// Accept `tools: web_search` as well as `tools: [web_search]`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Nothing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Nothing(()) => Vec::new(),
    })
}
