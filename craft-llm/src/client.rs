//! LLM Client — one interface for OpenAI-compatible and Ollama backends.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::types::{ChatRequest, LlmResponse};

/// Anything that can turn a chat request into a completion.
///
/// [`LlmClient`] is the production implementation; tests plug in scripted doubles.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run one completion. Must not retry on its own.
    async fn complete(&self, request: &ChatRequest) -> Result<LlmResponse, LlmError>;
}

/// Provider backend for chat inference.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    /// OpenAI-compatible API (Groq, OpenAI, Together, ...). `base_url` includes the `/v1` suffix.
    OpenAiCompatible { base_url: String, api_key: String },
    /// Ollama running locally.
    Ollama { base_url: String },
    /// No model available. Every call fails and callers fall back to empty results.
    None,
}

impl LlmProvider {
    fn name(&self) -> &'static str {
        match self {
            LlmProvider::OpenAiCompatible { .. } => "openai",
            LlmProvider::Ollama { .. } => "ollama",
            LlmProvider::None => "none",
        }
    }
}

/// The main LLM client that routes requests to the configured backend.
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
    model: String,
}

impl LlmClient {
    /// Create a new LLM client.
    #[must_use]
    pub fn new(provider: LlmProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            http: Client::new(),
            model: model.into(),
        }
    }

    /// Create a client with no backend (all calls fail → callers return empty results).
    #[must_use]
    pub fn none() -> Self {
        Self::new(LlmProvider::None, String::new())
    }

    /// Check if the client has a backend configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, LlmProvider::None)
    }

    /// Model name sent with every request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Backend name, for logs.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Generate using an OpenAI-compatible chat completions endpoint.
    async fn complete_openai(
        &self,
        base_url: &str,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });
        if request.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let builder = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body);

        let start = Instant::now();
        let json = self.send(builder, request).await?;
        let latency_ms = elapsed_ms(start);

        let text = json["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();
        let tokens = json["usage"]["completion_tokens"].as_u64().unwrap_or(0);

        Ok(LlmResponse {
            text,
            tokens_generated: u32::try_from(tokens).unwrap_or(u32::MAX),
            latency_ms,
            model: self.model.clone(),
        })
    }

    /// Generate using Ollama's chat API.
    async fn complete_ollama(
        &self,
        base_url: &str,
        request: &ChatRequest,
    ) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/api/chat", base_url.trim_end_matches('/'));
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "stream": false,
            "options": {
                "temperature": request.temperature,
                "num_predict": request.max_tokens,
            }
        });
        if request.json_mode {
            body["format"] = json!("json");
        }

        let start = Instant::now();
        let json = self.send(self.http.post(&url).json(&body), request).await?;
        let latency_ms = elapsed_ms(start);

        let text = json["message"]["content"].as_str().unwrap_or("").to_string();
        let tokens = json["eval_count"].as_u64().unwrap_or(0);

        Ok(LlmResponse {
            text,
            tokens_generated: u32::try_from(tokens).unwrap_or(u32::MAX),
            latency_ms,
            model: self.model.clone(),
        })
    }

    /// Send a prepared request and decode the success body, classifying failures.
    async fn send(
        &self,
        builder: RequestBuilder,
        request: &ChatRequest,
    ) -> Result<Value, LlmError> {
        let builder = match request.timeout_ms {
            Some(ms) => builder.timeout(Duration::from_millis(ms)),
            None => builder,
        };

        let resp = builder.send().await.inspect_err(|e| {
            if e.is_timeout() {
                warn!("{} request timed out", self.provider_name());
            } else {
                warn!("{} request failed: {}", self.provider_name(), e);
            }
        })?;

        let status = resp.status();
        if status.is_success() {
            return resp
                .json()
                .await
                .map_err(|e| LlmError::ParseError(e.to_string()));
        }

        let body = resp.text().await.unwrap_or_default();
        let err = classify_rejection(status, &body, request.json_mode);
        warn!("{} returned error: {}", self.provider_name(), err);
        Err(err)
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    async fn complete(&self, request: &ChatRequest) -> Result<LlmResponse, LlmError> {
        match &self.provider {
            LlmProvider::None => Err(LlmError::Unavailable("No LLM provider configured".into())),
            LlmProvider::OpenAiCompatible { base_url, api_key } => {
                self.complete_openai(base_url, api_key, request).await
            }
            LlmProvider::Ollama { base_url } => self.complete_ollama(base_url, request).await,
        }
    }
}

/// Error codes providers use when the JSON-object constraint could not be met.
const JSON_REJECTION_CODES: &[&str] = &["json_validate_failed"];

/// Message fragments that identify a JSON-mode rejection when no code is given.
const JSON_REJECTION_HINTS: &[&str] = &[
    "json_validate_failed",
    "failed to generate json",
    "response_format",
];

/// Map a non-success provider response to an [`LlmError`].
///
/// Only a 400 on a JSON-mode request that names the JSON constraint is
/// [`LlmError::ConstrainedOutputRejected`]; everything else is [`LlmError::Rejected`].
#[must_use]
pub fn classify_rejection(status: StatusCode, body: &str, json_mode: bool) -> LlmError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().map(|v| &v["error"]);

    // OpenAI/Groq: {"error": {"message", "code", ...}}; Ollama: {"error": "..."}.
    let message = error
        .and_then(|e| e["message"].as_str().or_else(|| e.as_str()))
        .unwrap_or(body)
        .to_string();
    let code = error.and_then(|e| e["code"].as_str()).unwrap_or("");

    if json_mode && status == StatusCode::BAD_REQUEST {
        let lowered = message.to_lowercase();
        if JSON_REJECTION_CODES.contains(&code)
            || JSON_REJECTION_HINTS.iter().any(|hint| lowered.contains(hint))
        {
            debug!(code, "JSON output mode rejected by provider");
            return LlmError::ConstrainedOutputRejected(message);
        }
    }

    LlmError::Rejected {
        status: status.as_u16(),
        message,
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
