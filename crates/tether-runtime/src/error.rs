//! Error types for runtime-client operations.

use thiserror::Error;

/// Result type alias for runtime-client operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur while driving the container runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The runtime binary could not be spawned at all.
    #[error("failed to invoke runtime `{bin}`: {source}")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },

    /// The runtime command ran but reported failure.
    #[error("runtime command `{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// The runtime produced output we could not interpret.
    #[error("unparseable runtime output for `{command}`: {output}")]
    UnparseableOutput { command: String, output: String },
}
