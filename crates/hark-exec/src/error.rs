//! Error types for parallel execution.

use std::error::Error;
use std::fmt;

use hark_core::BuildError;

/// Errors from registering or executing parallel tasks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecError {
    /// `exec()` was called with no registered task.
    NoTasks,
    /// The OS refused to start a worker thread for a task.
    SpawnFailed {
        /// Name the worker thread would have had.
        thread_name: String,
        /// Reason reported by the OS.
        reason: String,
    },
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTasks => write!(f, "no tasks registered"),
            Self::SpawnFailed {
                thread_name,
                reason,
            } => write!(f, "failed to spawn worker '{thread_name}': {reason}"),
        }
    }
}

impl Error for ExecError {}

impl From<ExecError> for BuildError {
    fn from(_: ExecError) -> Self {
        // A single spawn failure is absorbed by the host; anything that
        // reaches a builder means no task could run at all.
        BuildError::NoTasks
    }
}
