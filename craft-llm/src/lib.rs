//! # craft-llm — Chat Model Invocation for infini-craft
//!
//! Provides one interface for chat completion across backends chosen at startup:
//!   - **OpenAI-compatible API** (Groq by default, also OpenAI, Together, etc.)
//!   - **Ollama** (local inference)
//!   - **None** (every call fails, callers degrade to their empty result)
//!
//! All model calls in infini-craft go through this crate, ensuring:
//!   - Deterministic sampling (temperature 0 unless configured otherwise)
//!   - JSON-object output mode requested by default
//!   - One unconstrained retry when the provider cannot honour JSON mode
//!   - No other retries; every other failure propagates to the caller
//!
//! # Flow
//!
//! ```text
//! [ChatMessage] ──► ModelInvoker ──► ChatBackend (LlmClient | test double) ──► text
//!                      │
//!                      └─ ConstrainedOutputRejected? retry once with json_mode = false
//! ```

pub mod client;
pub mod credentials;
pub mod error;
pub mod invoker;
pub mod mock;
pub mod types;

pub use client::{ChatBackend, LlmClient, LlmProvider};
pub use error::LlmError;
pub use invoker::ModelInvoker;
pub use types::{ChatMessage, ChatRequest, LlmResponse, Role};
