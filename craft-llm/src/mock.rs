//! Scripted in-process backend for tests and offline runs.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::ChatBackend;
use crate::error::LlmError;
use crate::types::{ChatRequest, LlmResponse};

/// A [`ChatBackend`] that replays queued outcomes in order and records every request.
///
/// Once the script runs out it keeps returning the fallback reply (empty text by default).
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    fallback: Mutex<Option<String>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    /// Create an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with the same text to every call that finds the script empty.
    #[must_use]
    pub fn always(text: impl Into<String>) -> Self {
        let backend = Self::default();
        *backend.fallback.lock() = Some(text.into());
        backend
    }

    /// Queue a successful reply.
    pub fn push_text(&self, text: impl Into<String>) {
        self.script.lock().push_back(Ok(text.into()));
    }

    /// Queue a failure.
    pub fn push_error(&self, err: LlmError) {
        self.script.lock().push_back(Err(err));
    }

    /// Every request seen so far, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    /// Number of calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().push(request.clone());
        // Let concurrent callers interleave the way a network round trip would.
        tokio::task::yield_now().await;

        let next = self.script.lock().pop_front();
        let text = match next {
            Some(outcome) => outcome?,
            None => self.fallback.lock().clone().unwrap_or_default(),
        };
        Ok(LlmResponse {
            text,
            tokens_generated: 0,
            latency_ms: 0,
            model: "scripted".into(),
        })
    }
}
