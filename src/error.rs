//! Error types for crewflow.
//!
//! Uses thiserror for derive macros. Every fatal condition in the loader,
//! builder, engine and driver is one of these variants; `main` is the only
//! place that prints them.

use crate::engine::TemplateError;
use crate::exit_codes;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for crewflow operations.
#[derive(Error, Debug)]
pub enum CrewError {
    /// Operator provided invalid arguments or input.
    #[error("{0}")]
    UserError(String),

    /// Invalid settings or flow configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The selected flow has no directory under the config root.
    #[error("flow '{flow}' not found: directory '{path}' does not exist")]
    MissingFlow { flow: String, path: PathBuf },

    /// A required flow document is absent.
    #[error("flow '{flow}' is missing required document '{}'", path.display())]
    MissingDocument { flow: String, path: PathBuf },

    /// A document exists but is not valid YAML of the expected shape.
    #[error("failed to parse '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// Two records in one document share a lookup key.
    #[error("duplicate {kind} key '{key}' in flow '{flow}'")]
    DuplicateKey {
        flow: String,
        kind: &'static str,
        key: String,
    },

    /// A task references an agent that matches no key, alias, or role.
    #[error("task '{task}' references agent '{reference}', which matches no agent key or role (available: {available})")]
    AgentNotFound {
        task: String,
        reference: String,
        available: String,
    },

    /// Context references form a cycle.
    #[error("context references form a cycle: {}", tasks.join(" -> "))]
    ContextCycle { tasks: Vec<String> },

    /// The execution engine failed.
    #[error("execution failed: {0}")]
    Engine(String),

    /// A description or command template could not be rendered.
    #[error("failed to render {context}: {source}")]
    Template {
        context: String,
        #[source]
        source: TemplateError,
    },

    /// Filesystem operation failed.
    #[error("{action} '{}': {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CrewError {
    /// Build an `Io` error with the failing path attached.
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CrewError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CrewError::UserError(_) => exit_codes::USER_ERROR,
            CrewError::Config(_)
            | CrewError::MissingFlow { .. }
            | CrewError::MissingDocument { .. }
            | CrewError::Parse { .. }
            | CrewError::DuplicateKey { .. } => exit_codes::CONFIG_ERROR,
            CrewError::AgentNotFound { .. } | CrewError::ContextCycle { .. } => {
                exit_codes::RESOLUTION_FAILURE
            }
            CrewError::Engine(_) | CrewError::Template { .. } => exit_codes::ENGINE_FAILURE,
            CrewError::Io { .. } => exit_codes::IO_FAILURE,
        }
    }
}

/// Result type alias for crewflow operations.
pub type Result<T> = std::result::Result<T, CrewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_share_exit_code() {
        let errs = [
            CrewError::Config("bad".to_string()),
            CrewError::MissingFlow {
                flow: "demo".to_string(),
                path: PathBuf::from("config/demo"),
            },
            CrewError::MissingDocument {
                flow: "demo".to_string(),
                path: PathBuf::from("config/demo/tasks.yaml"),
            },
            CrewError::DuplicateKey {
                flow: "demo".to_string(),
                kind: "agent",
                key: "Writer".to_string(),
            },
        ];
        for err in errs {
            assert_eq!(err.exit_code(), exit_codes::CONFIG_ERROR);
        }
    }

    #[test]
    fn resolution_errors_have_resolution_exit_code() {
        let err = CrewError::AgentNotFound {
            task: "t1".to_string(),
            reference: "ghost".to_string(),
            available: "reviewer".to_string(),
        };
        assert_eq!(err.exit_code(), exit_codes::RESOLUTION_FAILURE);

        let err = CrewError::ContextCycle {
            tasks: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(err.exit_code(), exit_codes::RESOLUTION_FAILURE);
    }

    #[test]
    fn engine_error_has_engine_exit_code() {
        let err = CrewError::Engine("exit status 1".to_string());
        assert_eq!(err.exit_code(), exit_codes::ENGINE_FAILURE);
    }

    #[test]
    fn missing_document_names_the_file() {
        let err = CrewError::MissingDocument {
            flow: "demo".to_string(),
            path: PathBuf::from("config/demo/tasks.yaml"),
        };
        let msg = err.to_string();
        assert!(msg.contains("tasks.yaml"));
        assert!(msg.contains("demo"));
    }

    #[test]
    fn cycle_message_lists_path() {
        let err = CrewError::ContextCycle {
            tasks: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(err.to_string(), "context references form a cycle: a -> b -> a");
    }

    #[test]
    fn io_error_keeps_source() {
        use std::error::Error as _;

        let err = CrewError::io(
            "failed to create directory",
            "outputs/demo",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.exit_code(), exit_codes::IO_FAILURE);
        assert!(err.to_string().contains("outputs/demo"));
        assert!(err.source().is_some());
    }
}
