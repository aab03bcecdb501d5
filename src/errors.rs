//! Error types for TaskGuard
//!
//! A single error enum shared by every policy component. AI-provider
//! failures are produced here but consumed inside the engine and the
//! classifier; only caller-input and configuration errors reach the edges.

use thiserror::Error;

/// Main error type for the TaskGuard policy layer
#[derive(Error, Debug)]
pub enum PolicyError {
    /// Caller supplied a missing or malformed field
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No AI provider configured, or the provider refused the request
    #[error("AI provider unavailable: {0}")]
    AiUnavailable(String),

    /// AI call exceeded its deadline
    #[error("AI call timed out after {duration_ms}ms")]
    AiTimeout { duration_ms: u64 },

    /// AI returned something that is not the JSON we asked for
    #[error("AI response error: {0}")]
    AiResponse(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Task lookup failed in the task store
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// A quality check could not be evaluated
    #[error("Check failed to evaluate: {0}")]
    CheckFailed(String),

    /// Generic errors with context
    #[error("Policy error: {0}")]
    Generic(String),
}

impl PolicyError {
    /// Whether this error came from the AI provider path
    pub fn is_ai_failure(&self) -> bool {
        matches!(
            self,
            PolicyError::AiUnavailable(_)
                | PolicyError::AiTimeout { .. }
                | PolicyError::AiResponse(_)
                | PolicyError::HttpError(_)
        )
    }
}

/// Result type alias for policy operations
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Convert anyhow errors to PolicyError
impl From<anyhow::Error> for PolicyError {
    fn from(err: anyhow::Error) -> Self {
        PolicyError::Generic(err.to_string())
    }
}
