//! Run event log.
//!
//! Every run appends events to `<output-root>/<flow>/events.ndjson`, one JSON
//! object per line.
//!
//! # Event Format
//!
//! - `ts`: RFC3339 timestamp
//! - `action`: `run_started`, `run_completed` or `run_failed`
//! - `actor`: `user@HOST`
//! - `flow`: the flow name
//! - `details`: freeform object with action-specific details

use crate::error::{CrewError, Result};
use crate::report::flow_output_dir;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name of the per-flow event log.
pub const EVENTS_FILE: &str = "events.ndjson";

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    RunStarted,
    RunCompleted,
    RunFailed,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::RunStarted => write!(f, "run_started"),
            EventAction::RunCompleted => write!(f, "run_completed"),
            EventAction::RunFailed => write!(f, "run_failed"),
        }
    }
}

/// One line of the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub ts: DateTime<Utc>,
    pub action: EventAction,
    pub actor: String,
    pub flow: String,
    pub details: Value,
}

impl Event {
    /// Create an event for `flow`, stamped now and attributed to the current
    /// user and host.
    pub fn new(action: EventAction, flow: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: actor_string(),
            flow: flow.into(),
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| CrewError::UserError(format!("failed to serialize event to JSON: {}", e)))
    }
}

fn actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Path of the event log for `flow`.
pub fn events_file_path(output_root: &Path, flow: &str) -> PathBuf {
    flow_output_dir(output_root, flow).join(EVENTS_FILE)
}

/// Append `event` to its flow's event log, creating the file if needed.
pub fn append_event(output_root: &Path, event: &Event) -> Result<()> {
    let events_file = events_file_path(output_root, &event.flow);
    let json_line = event.to_ndjson_line()?;

    if let Some(dir) = events_file.parent()
        && !dir.exists()
    {
        fs::create_dir_all(dir)
            .map_err(|e| CrewError::io("failed to create events directory", dir, e))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&events_file)
        .map_err(|e| CrewError::io("failed to open events file", &events_file, e))?;

    writeln!(file, "{}", json_line)
        .and_then(|()| file.sync_all())
        .map_err(|e| CrewError::io("failed to write event to", &events_file, e))?;

    tracing::debug!(action = %event.action, flow = %event.flow, "event appended");
    Ok(())
}

/// Read back every event of `flow`'s log.
pub fn read_events(output_root: &Path, flow: &str) -> Result<Vec<Event>> {
    let events_file = events_file_path(output_root, flow);
    if !events_file.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(&events_file)
        .map_err(|e| CrewError::io("failed to read events file", &events_file, e))?;

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| CrewError::Parse {
                path: events_file.clone(),
                message: format!("line {}: {}", i + 1, e),
            })
        })
        .collect()
}
