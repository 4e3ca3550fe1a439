//! Report persistence.
//!
//! The final text of a run lands in
//! `<output-root>/<flow>/report_<YYYY-MM-DD_HH-MM-SS>.md`. Two runs inside the
//! same second get `_2`, `_3`, ... suffixes; an existing report is never
//! overwritten.

use crate::error::{CrewError, Result};
use crate::fs::atomic_write_file;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Directory holding reports and the event log for `flow`.
pub fn flow_output_dir(output_root: &Path, flow: &str) -> PathBuf {
    output_root.join(flow)
}

/// Persist `text` as a new report for `flow`, stamped with the current time.
pub fn save_report(output_root: &Path, flow: &str, text: &str) -> Result<PathBuf> {
    save_report_at(output_root, flow, text, Local::now())
}

/// Persist `text` as a new report for `flow`, stamped with `now`.
pub fn save_report_at(
    output_root: &Path,
    flow: &str,
    text: &str,
    now: DateTime<Local>,
) -> Result<PathBuf> {
    let dir = flow_output_dir(output_root, flow);
    fs::create_dir_all(&dir).map_err(|e| CrewError::io("failed to create output directory", &dir, e))?;

    let stamp = now.format(TIMESTAMP_FORMAT).to_string();
    let path = unused_report_path(&dir, &stamp);

    let mut content = text.to_string();
    if !content.ends_with('\n') {
        content.push('\n');
    }
    atomic_write_file(&path, &content)?;

    tracing::info!(flow, path = %path.display(), bytes = content.len(), "report saved");
    Ok(path)
}

fn unused_report_path(dir: &Path, stamp: &str) -> PathBuf {
    let first = dir.join(format!("report_{}.md", stamp));
    if !first.exists() {
        return first;
    }
    (2..)
        .map(|n| dir.join(format!("report_{}_{}.md", stamp, n)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 9, 14, 5, 7)
            .single()
            .unwrap()
    }

    #[test]
    fn test_report_name_uses_timestamp() {
        let temp = TempDir::new().unwrap();

        let path = save_report_at(temp.path(), "audit", "# Findings", fixed_time()).unwrap();

        assert_eq!(
            path,
            temp.path().join("audit").join("report_2024-03-09_14-05-07.md")
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Findings\n");
    }

    #[test]
    fn test_same_second_gets_suffix() {
        let temp = TempDir::new().unwrap();

        let first = save_report_at(temp.path(), "audit", "one", fixed_time()).unwrap();
        let second = save_report_at(temp.path(), "audit", "two", fixed_time()).unwrap();
        let third = save_report_at(temp.path(), "audit", "three", fixed_time()).unwrap();

        assert_ne!(first, second);
        assert!(second.ends_with("report_2024-03-09_14-05-07_2.md"));
        assert!(third.ends_with("report_2024-03-09_14-05-07_3.md"));
        assert_eq!(fs::read_to_string(&first).unwrap(), "one\n");
        assert_eq!(fs::read_to_string(&second).unwrap(), "two\n");
    }

    #[test]
    fn test_two_runs_produce_distinct_files() {
        let temp = TempDir::new().unwrap();

        let a = save_report(temp.path(), "demo", "first").unwrap();
        let b = save_report(temp.path(), "demo", "second").unwrap();

        assert_ne!(a, b);
        assert!(a.exists() && b.exists());
        let count = fs::read_dir(temp.path().join("demo")).unwrap().count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_output_root_is_created() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("not").join("yet");

        let path = save_report(&root, "demo", "text\n").unwrap();

        assert!(path.starts_with(root.join("demo")));
        assert_eq!(fs::read_to_string(&path).unwrap(), "text\n");
    }
}
