//! Implementation of the `crewflow list` command.

use super::Launcher;
use crate::error::{CrewError, Result};
use crate::events::{Event, read_events};
use crate::flow::list_flows;
use std::io::{self, Write};
use std::path::Path;

/// Print one flow per line, with the outcome of its last run if any.
pub fn cmd_list(launcher: &Launcher) -> Result<()> {
    write_flow_list(launcher, &mut io::stdout())
}

fn write_flow_list<W: Write>(launcher: &Launcher, out: &mut W) -> Result<()> {
    let config_root = launcher.config_root();
    let flows = list_flows(&config_root)?;
    let output_root = launcher.output_root();

    let written = if flows.is_empty() {
        writeln!(out, "No flows found under {}", config_root.display())
    } else {
        let width = flows.iter().map(String::len).max().unwrap_or(0);
        flows
            .iter()
            .try_for_each(|flow| match last_event(&output_root, flow) {
                Some(event) => writeln!(
                    out,
                    "{:<width$}  last run: {} at {}",
                    flow,
                    event.action,
                    event.ts.format("%Y-%m-%d %H:%M:%S UTC"),
                    width = width
                ),
                None => writeln!(out, "{}", flow),
            })
    };
    written.map_err(|e| CrewError::UserError(format!("console I/O failed: {}", e)))
}

/// A damaged event log only costs the status column.
fn last_event(output_root: &Path, flow: &str) -> Option<Event> {
    match read_events(output_root, flow) {
        Ok(mut events) => events.pop(),
        Err(e) => {
            tracing::warn!(flow, error = %e, "could not read event log");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventAction, append_event};
    use crate::settings::Settings;
    use crate::test_support::write_flow;
    use tempfile::TempDir;

    #[test]
    fn test_lists_flows_sorted() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("config");
        write_flow(&root, "marketing", "", "");
        write_flow(&root, "audit", "", "");
        let launcher = Launcher::new(temp.path().to_path_buf(), Settings::default());

        let mut out = Vec::new();
        write_flow_list(&launcher, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "audit\nmarketing\n");
    }

    #[test]
    fn test_empty_config_root() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("config")).unwrap();
        let launcher = Launcher::new(temp.path().to_path_buf(), Settings::default());

        let mut out = Vec::new();
        write_flow_list(&launcher, &mut out).unwrap();

        assert!(String::from_utf8(out).unwrap().starts_with("No flows found"));
    }

    #[test]
    fn test_missing_config_root_is_config_error() {
        let temp = TempDir::new().unwrap();
        let launcher = Launcher::new(temp.path().to_path_buf(), Settings::default());

        let err = write_flow_list(&launcher, &mut Vec::new()).unwrap_err();

        assert!(matches!(err, CrewError::Config(_)));
    }

    #[test]
    fn test_shows_last_run_status() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("config");
        write_flow(&root, "audit", "", "");
        write_flow(&root, "marketing", "", "");
        let launcher = Launcher::new(temp.path().to_path_buf(), Settings::default());
        let output_root = launcher.output_root();
        append_event(&output_root, &Event::new(EventAction::RunStarted, "audit")).unwrap();
        append_event(&output_root, &Event::new(EventAction::RunFailed, "audit")).unwrap();

        let mut out = Vec::new();
        write_flow_list(&launcher, &mut out).unwrap();

        let shown = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = shown.lines().collect();
        assert!(lines[0].starts_with("audit      last run: run_failed at "));
        assert_eq!(lines[1], "marketing");
    }

    #[test]
    fn test_damaged_event_log_still_lists_flow() {
        let temp = TempDir::new().unwrap();
        write_flow(&temp.path().join("config"), "audit", "", "");
        let launcher = Launcher::new(temp.path().to_path_buf(), Settings::default());
        let log = crate::events::events_file_path(&launcher.output_root(), "audit");
        std::fs::create_dir_all(log.parent().unwrap()).unwrap();
        std::fs::write(&log, "not json\n").unwrap();

        let mut out = Vec::new();
        write_flow_list(&launcher, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "audit\n");
    }
}
