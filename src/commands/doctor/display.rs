//! Rendering of the doctor report.

use super::{DoctorReport, IssueSeverity};
use std::io::{self, Write};

/// Write the doctor report to `out`.
pub fn write_report<W: Write>(report: &DoctorReport, out: &mut W) -> io::Result<()> {
    if !report.passed.is_empty() {
        writeln!(out, "Checks passed ({}):", report.passed.len())?;
        writeln!(out)?;
        for line in &report.passed {
            writeln!(out, "  - {}", line)?;
        }
        writeln!(out)?;
    }

    if report.issues.is_empty() {
        writeln!(out, "No issues detected.")?;
        return Ok(());
    }

    writeln!(out, "Issues detected ({}):", report.issues.len())?;
    writeln!(out)?;
    for (i, issue) in report.issues.iter().enumerate() {
        writeln!(
            out,
            "  {}. [{}] {} - {}",
            i + 1,
            issue.severity,
            issue.category,
            issue.description
        )?;
        if let Some(remediation) = &issue.remediation {
            writeln!(out, "     Fix:  {}", remediation)?;
        }
        writeln!(out)?;
    }

    writeln!(
        out,
        "Summary: {} errors, {} warnings.",
        report.count(IssueSeverity::Error),
        report.count(IssueSeverity::Warning)
    )
}
