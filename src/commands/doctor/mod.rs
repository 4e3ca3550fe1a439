//! Implementation of the `crewflow doctor` command.
//!
//! Diagnoses whether flows can reach their models, without running any task.
//!
//! # Checks
//!
//! - Each provider in `providers` whose credential variable is unset
//! - Flows that fail to load or wire
//! - Each model an agent uses (its `llm`, else `default_model`): no provider
//!   prefix, no mapped provider, or an unset credential variable
//!
//! # Ping mode (`--ping`)
//!
//! Every model not already failing sends one trivial prompt through the
//! engine command. A failed call is reported as an error.

mod checks;
mod display;


use super::Launcher;
use crate::cli::DoctorArgs;
use crate::credentials::ProviderRoutes;
use crate::engine::CommandEngine;
use crate::error::{CrewError, Result};
use crate::flow::{list_flows, validate_flow_name};
use std::io;

use checks::{check_connectivity, check_flows, check_providers};
use display::write_report;

/// Severity level for issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// The flow may still run, but probably not as intended.
    Warning,
    /// A run would fail.
    Error,
}

impl std::fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueSeverity::Warning => write!(f, "WARNING"),
            IssueSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// A detected issue with a recommended fix.
#[derive(Debug, Clone)]
pub struct Issue {
    pub severity: IssueSeverity,
    pub category: String,
    pub description: String,
    pub remediation: Option<String>,
}

impl Issue {
    pub fn new(severity: IssueSeverity, category: &str, description: &str) -> Self {
        Self {
            severity,
            category: category.to_string(),
            description: description.to_string(),
            remediation: None,
        }
    }

    pub fn with_remediation(mut self, remediation: &str) -> Self {
        self.remediation = Some(remediation.to_string());
        self
    }
}

/// Result of running the doctor checks.
#[derive(Debug, Default)]
pub struct DoctorReport {
    pub issues: Vec<Issue>,
    /// One line per check that passed.
    pub passed: Vec<String>,
}

impl DoctorReport {
    pub fn count(&self, severity: IssueSeverity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(IssueSeverity::Error) > 0
    }
}

/// Execute the `crewflow doctor` command.
pub fn cmd_doctor(launcher: &Launcher, args: DoctorArgs) -> Result<()> {
    let report = diagnose(launcher, &args, |name: &str| std::env::var(name).ok())?;

    write_report(&report, &mut io::stdout())
        .map_err(|e| CrewError::UserError(format!("console I/O failed: {}", e)))?;

    if report.has_errors() {
        return Err(CrewError::UserError(format!(
            "found {} error(s); fix them before running the affected flows",
            report.count(IssueSeverity::Error)
        )));
    }
    Ok(())
}

/// Run every check, reading credential variables through `lookup`.
fn diagnose<F>(launcher: &Launcher, args: &DoctorArgs, lookup: F) -> Result<DoctorReport>
where
    F: Fn(&str) -> Option<String>,
{
    let flows = match &args.flow {
        Some(flow) => vec![validate_flow_name(flow)?.to_string()],
        None => list_flows(&launcher.config_root())?,
    };
    let routes = ProviderRoutes::new(launcher.settings.providers.clone());

    let mut report = DoctorReport::default();
    check_providers(&routes, &lookup, &mut report);
    let usable = check_flows(launcher, &flows, &routes, &lookup, &mut report);

    if args.ping {
        let engine = CommandEngine::from_settings(&launcher.settings, launcher.home.clone());
        check_connectivity(&usable, |model| engine.ping(model), &mut report);
    }

    tracing::debug!(
        flows = flows.len(),
        errors = report.count(IssueSeverity::Error),
        warnings = report.count(IssueSeverity::Warning),
        "doctor finished"
    );
    Ok(report)
}
