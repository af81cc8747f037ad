//! Arbiter error types.

use thiserror::Error;

/// Errors that can occur during lifecycle arbitration.
#[derive(Debug, Error)]
pub enum ArbiterError {
    #[error("feature not configured: {0}")]
    NotConfigured(String),

    #[error("refusing to kill administratively disabled feature: {0}")]
    Disabled(String),

    #[error("no instance to wait on for feature: {0}")]
    NoInstance(String),

    #[error("state store error: {0}")]
    State(#[from] tether_state::StateError),

    #[error("runtime error: {0}")]
    Runtime(#[from] tether_runtime::RuntimeError),
}

pub type ArbiterResult<T> = Result<T, ArbiterError>;
