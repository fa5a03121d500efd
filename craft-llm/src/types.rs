//! Core types for chat requests and responses.

use serde::{Deserialize, Serialize};

/// Default sampling temperature. Zero keeps replies stable for memoization.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Default completion budget. Generous so JSON replies are not cut off mid-object.
pub const DEFAULT_MAX_TOKENS: u32 = 30_000;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the whole exchange.
    System,
    /// The request itself.
    User,
    /// A prior model turn (only appears in caller-supplied few-shot sequences).
    Assistant,
}

/// One message of a chat completion input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who authored the message.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A single, self-contained chat completion request. No history is carried between requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Ordered message sequence.
    pub messages: Vec<ChatMessage>,
    /// Temperature (0.0 = deterministic).
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Ask the provider to guarantee a syntactically valid JSON object.
    pub json_mode: bool,
    /// Per-request timeout in milliseconds. `None` leaves it to the HTTP client.
    pub timeout_ms: Option<u64>,
}

impl ChatRequest {
    /// Create a JSON-mode request with deterministic sampling.
    #[must_use]
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            json_mode: true,
            timeout_ms: None,
        }
    }

    /// Enable or disable JSON-object output mode.
    #[must_use]
    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion budget.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: Option<u64>) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// A response from the chat model.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmResponse {
    /// The generated text.
    pub text: String,
    /// How many tokens were generated.
    pub tokens_generated: u32,
    /// Latency in milliseconds.
    pub latency_ms: u64,
    /// Which model was used.
    pub model: String,
}
