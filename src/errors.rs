use std::time::Duration;
use thiserror::Error;

use crate::implementations::config::ConfigError;

/// Custom error types for the clarify-verify system
#[derive(Debug, Error)]
pub enum CvError {
    /// The code-producing collaborator raised or returned unusable output.
    #[error("Generation failure: {0}")]
    GenerationFailure(String),

    #[error("Generation timed out after {0:?}")]
    GenerationTimeout(Duration),

    #[error("Could not extract an artifact from the response: {0}")]
    ExtractionError(String),

    #[error("Error in external tool {tool}: {message}")]
    ExternalToolError { tool: String, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type specific to clarify-verify operations
pub type CvResult<T> = Result<T, CvError>;

impl CvError {
    /// True for errors raised while producing or repairing code. These end the
    /// repair loop in the aborted state and are never retried.
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            CvError::GenerationFailure(_)
                | CvError::GenerationTimeout(_)
                | CvError::ExtractionError(_)
                | CvError::ExternalToolError { .. }
        )
    }
}
