use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Error type for adapter operations.
///
/// None of these are retried by the adapter; every call is single-shot and
/// retry policy, if any, belongs to the layer above.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// A configured tool directory or executable does not exist
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    /// The wrapped tool exited non-zero without a known empty-state sentinel
    #[error("tool invocation failed: {message}\noutput: {output}")]
    ToolInvocation { message: String, output: String },

    /// Output classified as success but did not parse under either strategy
    #[error("malformed tool output: {message}\noutput: {output}")]
    MalformedOutput { message: String, output: String },

    /// The subprocess exceeded its allotted time and was killed
    #[error("tool timed out after {0:?}")]
    Timeout(Duration),

    /// Caller-supplied input violated a precondition; no subprocess was spawned
    #[error("invalid input: {0}")]
    Validation(String),

    /// Invoice generation reported success but no PDF is discoverable
    #[error("no invoice artifact produced in {0}")]
    ArtifactNotProduced(PathBuf),

    /// Spawning or waiting on the subprocess failed at the OS level
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdapterError {
    /// Shorthand for a `ToolInvocation` error carrying the raw output.
    pub fn invocation(message: impl Into<String>, output: impl Into<String>) -> Self {
        Self::ToolInvocation {
            message: message.into(),
            output: output.into(),
        }
    }

    /// Shorthand for a `MalformedOutput` error carrying the raw output.
    pub fn malformed(message: impl Into<String>, output: impl Into<String>) -> Self {
        Self::MalformedOutput {
            message: message.into(),
            output: output.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AdapterError>;
