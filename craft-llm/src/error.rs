//! LLM error types.

use thiserror::Error;

/// Errors that can occur during chat model calls.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed before a response arrived.
    #[error("LLM request failed: {0}")]
    RequestFailed(String),

    /// The provider answered but the body was not the expected completion shape.
    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    /// The provider could not satisfy JSON-object output mode for this request.
    ///
    /// This is the only error the invoker recovers from (by retrying without the constraint).
    #[error("LLM provider rejected JSON output mode: {0}")]
    ConstrainedOutputRejected(String),

    /// The provider rejected the request (auth, quota, bad request, server error, ...).
    #[error("LLM provider rejected request with HTTP {status}: {message}")]
    Rejected {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Error message or raw body returned by the provider.
        message: String,
    },

    /// Request timed out.
    #[error("LLM request timed out")]
    Timeout,

    /// LLM provider is unavailable.
    #[error("LLM provider unavailable: {0}")]
    Unavailable(String),
}

impl LlmError {
    /// Whether this error means JSON mode could not be honoured.
    #[must_use]
    pub fn is_constrained_output_rejection(&self) -> bool {
        matches!(self, LlmError::ConstrainedOutputRejected(_))
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_connect() {
            LlmError::Unavailable(err.to_string())
        } else {
            LlmError::RequestFailed(err.to_string())
        }
    }
}
