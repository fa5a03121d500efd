//! Model Invoker — JSON-mode first, one unconstrained retry when the provider can't comply.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::client::ChatBackend;
use crate::error::LlmError;
use crate::types::{ChatMessage, ChatRequest, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};

/// Sends message sequences to a [`ChatBackend`] and returns the trimmed reply text.
#[derive(Clone)]
pub struct ModelInvoker {
    backend: Arc<dyn ChatBackend>,
    temperature: f32,
    max_tokens: u32,
    timeout_ms: Option<u64>,
}

impl ModelInvoker {
    /// Create an invoker with deterministic sampling and the default token budget.
    #[must_use]
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_ms: None,
        }
    }

    /// Override the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Override the completion budget.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set a per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: Option<u64>) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Send `messages` to the model and return its reply with surrounding whitespace stripped.
    ///
    /// When `json_constrained` is set and the provider rejects the request because it cannot
    /// guarantee a JSON object, the identical messages are sent once more without the constraint
    /// and that reply is returned. Every other error is returned as-is.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`LlmError`] for any failure other than the recovered JSON-mode
    /// rejection, and the retry's error if the unconstrained attempt fails too.
    pub async fn invoke(
        &self,
        messages: &[ChatMessage],
        json_constrained: bool,
    ) -> Result<String, LlmError> {
        let request = ChatRequest::new(messages.to_vec())
            .with_json_mode(json_constrained)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_timeout(self.timeout_ms);

        let first = self.backend.complete(&request).await;
        let response = match first {
            Err(LlmError::ConstrainedOutputRejected(reason)) if request.json_mode => {
                warn!(%reason, "JSON output mode rejected, retrying unconstrained");
                self.backend
                    .complete(&request.with_json_mode(false))
                    .await?
            }
            other => other?,
        };

        debug!(
            model = %response.model,
            latency_ms = response.latency_ms,
            tokens = response.tokens_generated,
            "model call complete"
        );
        Ok(response.text.trim().to_string())
    }
}
