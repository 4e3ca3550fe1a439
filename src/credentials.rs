//! Provider credential routing.
//!
//! A model reference such as `gemini/gemini-1.5-pro` names its provider in
//! the segment before the first `/`. The provider id is looked up in an
//! explicit map (from settings) to find the environment variable holding the
//! credential. Nothing is inferred from the rest of the model string.
//!
//! Every failure here is permissive: the engine call proceeds without a
//! credential and fails at call time if the provider needs one.

use std::collections::BTreeMap;

/// A credential resolved for one model reference.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub provider: String,
    pub variable: String,
    pub value: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("provider", &self.provider)
            .field("variable", &self.variable)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Provider id of a model reference, if it has one.
pub fn provider_of(model: &str) -> Option<&str> {
    let (provider, rest) = model.trim().split_once('/')?;
    if provider.is_empty() || rest.is_empty() {
        None
    } else {
        Some(provider)
    }
}

/// Explicit provider id -> credential variable map.
#[derive(Debug, Clone, Default)]
pub struct ProviderRoutes {
    routes: BTreeMap<String, String>,
}

impl ProviderRoutes {
    pub fn new(routes: BTreeMap<String, String>) -> Self {
        Self {
            routes: routes
                .into_iter()
                .map(|(provider, variable)| (provider.to_lowercase(), variable))
                .collect(),
        }
    }

    /// Mapped `(provider, variable)` pairs, ordered by provider id.
    pub fn providers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes
            .iter()
            .map(|(provider, variable)| (provider.as_str(), variable.as_str()))
    }

    /// Credential variable name for `model`, if its provider is mapped.
    pub fn variable_for(&self, model: &str) -> Option<&str> {
        let provider = provider_of(model)?.to_lowercase();
        self.routes.get(&provider).map(String::as_str)
    }

    /// Resolve the credential for `model` from the process environment.
    pub fn resolve(&self, model: &str) -> Option<Credential> {
        self.resolve_with(model, |name| std::env::var(name).ok())
    }

    /// Resolve the credential for `model` using `lookup` for variable values.
    pub fn resolve_with<F>(&self, model: &str, lookup: F) -> Option<Credential>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(provider) = provider_of(model) else {
            tracing::warn!(model, "model reference has no provider prefix; no credential");
            return None;
        };
        let Some(variable) = self.variable_for(model) else {
            tracing::warn!(model, provider, "no credential variable mapped for provider");
            return None;
        };
        match lookup(variable).filter(|v| !v.trim().is_empty()) {
            Some(value) => Some(Credential {
                provider: provider.to_string(),
                variable: variable.to_string(),
                value,
            }),
            None => {
                tracing::warn!(model, variable, "credential variable is not set");
                None
            }
        }
    }
}
