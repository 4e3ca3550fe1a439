//! Locating and loading flow documents from the config root.

use super::document::{Record, parse_records};
use super::spec::{AgentSpec, TaskSpec};
use crate::error::{CrewError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File stem of the agent document.
pub const AGENTS_DOCUMENT: &str = "agents";

/// File stem of the task document.
pub const TASKS_DOCUMENT: &str = "tasks";

/// Accepted document extensions, in order of preference.
const EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Both parsed documents of one flow.
#[derive(Debug, Clone)]
pub struct FlowDocuments {
    pub flow: String,
    pub agents: Vec<Record<AgentSpec>>,
    pub tasks: Vec<Record<TaskSpec>>,
}

impl FlowDocuments {
    /// Load `<config_root>/<flow>/{agents,tasks}.yaml`.
    ///
    /// Both files are located before either is parsed, so a missing document
    /// is always reported as `MissingDocument` rather than a parse error.
    /// Nothing is created on disk.
    pub fn load(config_root: &Path, flow: &str) -> Result<Self> {
        let flow = validate_flow_name(flow)?;

        let dir = config_root.join(flow);
        if !dir.is_dir() {
            return Err(CrewError::MissingFlow {
                flow: flow.to_string(),
                path: dir,
            });
        }

        let agents_path = locate_document(&dir, flow, AGENTS_DOCUMENT)?;
        let tasks_path = locate_document(&dir, flow, TASKS_DOCUMENT)?;

        let agents = parse_records::<AgentSpec>(&agents_path, &read_document(&agents_path)?)?;
        let tasks = parse_records::<TaskSpec>(&tasks_path, &read_document(&tasks_path)?)?;

        tracing::info!(
            flow,
            agents = agents.len(),
            tasks = tasks.len(),
            "loaded flow documents"
        );

        Ok(Self {
            flow: flow.to_string(),
            agents,
            tasks,
        })
    }
}

/// List flow names (subdirectories of the config root), sorted.
///
/// The config root is not created when absent; that is a configuration error.
pub fn list_flows(config_root: &Path) -> Result<Vec<String>> {
    if !config_root.is_dir() {
        return Err(CrewError::Config(format!(
            "config root '{}' does not exist; create one subdirectory per flow containing agents.yaml and tasks.yaml",
            config_root.display()
        )));
    }

    let entries = fs::read_dir(config_root)
        .map_err(|e| CrewError::io("failed to read config root", config_root, e))?;

    let mut flows = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CrewError::io("failed to read config root", config_root, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str())
            && !name.starts_with('.')
        {
            flows.push(name.to_string());
        }
    }
    flows.sort();
    Ok(flows)
}

/// Trim `flow` and reject names that would escape the config root.
///
/// Returns the trimmed name, which is what callers should join onto paths.
pub fn validate_flow_name(flow: &str) -> Result<&str> {
    let trimmed = flow.trim();
    if trimmed.is_empty() {
        return Err(CrewError::UserError("flow name cannot be empty".to_string()));
    }
    if trimmed == "." || trimmed == ".." || trimmed.contains(['/', '\\']) {
        return Err(CrewError::UserError(format!(
            "invalid flow name '{}': must be a single directory name under the config root",
            flow
        )));
    }
    Ok(trimmed)
}

fn locate_document(dir: &Path, flow: &str, stem: &str) -> Result<PathBuf> {
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|path| path.is_file())
        .ok_or_else(|| CrewError::MissingDocument {
            flow: flow.to_string(),
            path: dir.join(format!("{}.{}", stem, EXTENSIONS[0])),
        })
}

fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| CrewError::io("failed to read document", path, e))
}
