//! Individual doctor checks.

use super::{DoctorReport, Issue, IssueSeverity};
use crate::commands::Launcher;
use crate::commands::run::load_pipeline;
use crate::credentials::{ProviderRoutes, provider_of};
use crate::error::Result;
use std::collections::{BTreeMap, BTreeSet};

fn is_set<F>(lookup: &F, variable: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(variable).is_some_and(|value| !value.trim().is_empty())
}

fn set_variable_hint(variable: &str) -> String {
    format!(
        "Set {} in the environment or in the .env file of the launcher home",
        variable
    )
}

/// Report whether each mapped provider has its credential variable set.
///
/// An unset provider is only a warning; no flow may use it.
pub fn check_providers<F>(routes: &ProviderRoutes, lookup: &F, report: &mut DoctorReport)
where
    F: Fn(&str) -> Option<String>,
{
    for (provider, variable) in routes.providers() {
        if is_set(lookup, variable) {
            report
                .passed
                .push(format!("provider '{}': {} is set", provider, variable));
        } else {
            report.issues.push(
                Issue::new(
                    IssueSeverity::Warning,
                    "missing_credential",
                    &format!("provider '{}': {} is not set", provider, variable),
                )
                .with_remediation(&set_variable_hint(variable)),
            );
        }
    }
}

/// Check the model of every agent in `flows`.
///
/// Returns the models a call could reach, i.e. every model that is not
/// missing its credential.
pub fn check_flows<F>(
    launcher: &Launcher,
    flows: &[String],
    routes: &ProviderRoutes,
    lookup: &F,
    report: &mut DoctorReport,
) -> BTreeSet<String>
where
    F: Fn(&str) -> Option<String>,
{
    let default_model = launcher.settings.default_model.as_deref();

    // model -> "flow/agent" users
    let mut usage: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for flow in flows {
        let pipeline = match load_pipeline(launcher, flow) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                report.issues.push(
                    Issue::new(IssueSeverity::Error, "flow", &e.to_string())
                        .with_remediation(&format!("Run `crewflow check {}` for details", flow)),
                );
                continue;
            }
        };

        for agent in pipeline.agents() {
            match agent.llm.as_deref().or(default_model) {
                Some(model) => usage
                    .entry(model.trim().to_string())
                    .or_default()
                    .push(format!("{}/{}", flow, agent.key)),
                None => report.issues.push(
                    Issue::new(
                        IssueSeverity::Error,
                        "no_model",
                        &format!(
                            "agent '{}' in flow '{}' has no llm and no default_model is configured",
                            agent.key, flow
                        ),
                    )
                    .with_remediation("Set `llm` on the agent or `default_model` in crewflow.yaml"),
                ),
            }
        }
    }

    let mut usable = BTreeSet::new();
    for (model, users) in usage {
        let used_by = users.join(", ");
        match (provider_of(&model), routes.variable_for(&model)) {
            (None, _) => {
                report.issues.push(
                    Issue::new(
                        IssueSeverity::Warning,
                        "no_provider",
                        &format!(
                            "model '{}' (used by {}) has no provider prefix; no credential is passed",
                            model, used_by
                        ),
                    )
                    .with_remediation("Write the model as <provider>/<model>"),
                );
                usable.insert(model);
            }
            (Some(provider), None) => {
                report.issues.push(
                    Issue::new(
                        IssueSeverity::Warning,
                        "unmapped_provider",
                        &format!(
                            "model '{}' (used by {}): provider '{}' has no credential variable",
                            model, used_by, provider
                        ),
                    )
                    .with_remediation(&format!(
                        "Add `{}: <VARIABLE>` under `providers` in crewflow.yaml",
                        provider
                    )),
                );
                usable.insert(model);
            }
            (Some(_), Some(variable)) if is_set(lookup, variable) => {
                report
                    .passed
                    .push(format!("model '{}': {} is set", model, variable));
                usable.insert(model);
            }
            (Some(_), Some(variable)) => {
                report.issues.push(
                    Issue::new(
                        IssueSeverity::Error,
                        "missing_credential",
                        &format!(
                            "model '{}' (used by {}) needs {}, which is not set",
                            model, used_by, variable
                        ),
                    )
                    .with_remediation(&set_variable_hint(variable)),
                );
            }
        }
    }
    usable
}

/// Send one prompt to each model through `ping`; failures are errors.
pub fn check_connectivity<P>(models: &BTreeSet<String>, ping: P, report: &mut DoctorReport)
where
    P: Fn(&str) -> Result<String>,
{
    for model in models {
        match ping(model) {
            Ok(reply) => {
                let first = reply.lines().next().unwrap_or_default();
                report
                    .passed
                    .push(format!("model '{}' answered: {}", model, first));
            }
            Err(e) => report.issues.push(
                Issue::new(
                    IssueSeverity::Error,
                    "connection",
                    &format!("model '{}' did not answer: {}", model, e),
                )
                .with_remediation("Check the credential and `engine.command` in crewflow.yaml"),
            ),
        }
    }
}
