//! Execution engines.
//!
//! An engine takes a resolved pipeline plus named inputs and returns the
//! final text of the run. The driver knows nothing else about it.
//!
//! - **CommandEngine**: runs each task through a configured command, feeding
//!   the rendered prompt on stdin and reading the answer from stdout
//! - **PlanEngine**: renders the plan and the substituted descriptions
//!   without executing anything (`--dry-run`)

mod command;
mod plan;
mod process;
mod prompt;
mod template;

pub use command::CommandEngine;
pub use plan::PlanEngine;
pub use template::{TemplateError, Variables};

#[cfg(test)]
pub(crate) use template::vars;

use crate::crew::ResolvedPipeline;
use crate::error::Result;

/// Named operator inputs substituted into task descriptions.
pub type Inputs = Variables;

/// Runs a resolved pipeline to completion.
pub trait ExecutionEngine {
    /// Execute every task once and return the final result text.
    fn execute(&self, pipeline: &ResolvedPipeline, inputs: &Inputs) -> Result<String>;
}
