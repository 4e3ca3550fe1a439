//! Capability registry: the fixed mapping from tool names used in agent
//! documents to the tool handles handed to the execution engine.

use std::collections::BTreeMap;

/// A capability an agent may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolHandle {
    /// Canonical tool name.
    pub name: String,
    /// One-line description shown to the model.
    pub description: String,
}

impl ToolHandle {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Lookup table from tool name (or alias) to handle.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    tools: BTreeMap<String, ToolHandle>,
}

impl CapabilityRegistry {
    /// Registry with the built-in capabilities.
    pub fn builtin() -> Self {
        let mut registry = Self::default();

        let search = ToolHandle::new("web_search", "Search the web and return the top results");
        let scrape = ToolHandle::new("scrape_website", "Fetch a web page and return its text");
        let read = ToolHandle::new("file_read", "Read a file from the working directory");
        let write = ToolHandle::new("file_write", "Write text to a file in the working directory");

        registry.register("search", search.clone());
        registry.register("web_search", search);
        registry.register("scrape", scrape.clone());
        registry.register("scrape_website", scrape);
        registry.register("file_read", read);
        registry.register("file_write", write);
        registry
    }

    /// Register `handle` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &str, handle: ToolHandle) {
        self.tools.insert(normalize(name), handle);
    }

    /// Resolve a tool name. Matching ignores case, surrounding whitespace,
    /// and treats `-` like `_`.
    pub fn resolve(&self, name: &str) -> Option<&ToolHandle> {
        self.tools.get(&normalize(name))
    }

    /// All registered names, including aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase().replace('-', "_")
}
