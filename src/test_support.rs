use crate::crew::ResolvedPipeline;
use crate::engine::{ExecutionEngine, Inputs};
use crate::error::{CrewError, Result};
use crate::flow::{AgentSpec, FlowDocuments, TaskSpec, parse_records};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Write `<root>/<flow>/{agents,tasks}.yaml` and return the flow directory.
pub(crate) fn write_flow(root: &Path, flow: &str, agents_yaml: &str, tasks_yaml: &str) -> PathBuf {
    let dir = root.join(flow);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("agents.yaml"), agents_yaml).unwrap();
    std::fs::write(dir.join("tasks.yaml"), tasks_yaml).unwrap();
    dir
}

/// Parse documents in memory, without touching the filesystem.
pub(crate) fn flow_docs(flow: &str, agents_yaml: &str, tasks_yaml: &str) -> FlowDocuments {
    FlowDocuments {
        flow: flow.to_string(),
        agents: parse_records::<AgentSpec>(Path::new("agents.yaml"), agents_yaml).unwrap(),
        tasks: parse_records::<TaskSpec>(Path::new("tasks.yaml"), tasks_yaml).unwrap(),
    }
}

/// Engine double that records what it was asked to run.
#[derive(Default)]
pub(crate) struct RecordingEngine {
    pub(crate) reply: String,
    pub(crate) fail_with: Option<String>,
    pub(crate) calls: Mutex<Vec<(String, Inputs)>>,
}

impl RecordingEngine {
    pub(crate) fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ExecutionEngine for RecordingEngine {
    fn execute(&self, pipeline: &ResolvedPipeline, inputs: &Inputs) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((pipeline.flow().to_string(), inputs.clone()));
        match &self.fail_with {
            Some(message) => Err(CrewError::Engine(message.clone())),
            None => Ok(self.reply.clone()),
        }
    }
}
