//! Error types for the crafting pipeline.

use thiserror::Error;

/// Top-level error type for crafting operations.
///
/// Parsing never produces one of these: malformed replies degrade to empty fields.
#[derive(Error, Debug)]
pub enum CraftError {
    /// The model call failed and was not recoverable by the invoker.
    #[error("Model call failed: {0}")]
    Llm(#[from] craft_llm::LlmError),

    /// Caller input cannot form a prompt (empty symbol list, blank symbol, no messages).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, CraftError>;
