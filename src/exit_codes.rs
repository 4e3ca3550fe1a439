//! Exit code constants for the crewflow CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, empty input, aborted prompt)
//! - 2: Configuration error (missing flow, missing document, bad YAML)
//! - 3: Resolution failure (unknown agent reference, context cycle)
//! - 4: Execution engine failure
//! - 5: Filesystem failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, empty operator input, or an aborted prompt.
pub const USER_ERROR: i32 = 1;

/// Configuration error: missing flow directory or document, invalid YAML or settings.
pub const CONFIG_ERROR: i32 = 2;

/// Resolution failure: a task's agent cannot be resolved or context edges form a cycle.
pub const RESOLUTION_FAILURE: i32 = 3;

/// Execution engine failure: command failed, timed out, or a template could not render.
pub const ENGINE_FAILURE: i32 = 4;

/// Filesystem failure while writing reports or event logs.
pub const IO_FAILURE: i32 = 5;
