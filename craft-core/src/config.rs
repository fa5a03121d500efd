//! Configuration for the crafting service.
//!
//! Maps directly to `craft.toml`. Every field has a default, so an empty file
//! (or no file at all) gives a working Groq-backed service.

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use craft_llm::credentials::resolve_api_key;
use craft_llm::{LlmClient, LlmProvider};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CraftError, Result};

const DEFAULT_OPENAI_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CraftConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Chat model settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Memoization settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Prompt template overrides.
    #[serde(default)]
    pub prompts: PromptsConfig,
}

impl CraftConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `CraftError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| CraftError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log filter used when `RUST_LOG` is not set: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Which backend answers chat requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible remote API (Groq by default).
    OpenAi,
    /// Local Ollama server.
    Ollama,
    /// No backend; every request returns the empty result.
    None,
}

/// Chat model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider: "openai", "ollama", "none".
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,
    /// Base URL of the API. For OpenAI-compatible providers this includes `/v1`.
    /// Unset picks the provider's usual endpoint (Groq, or a local Ollama).
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model name sent with every request.
    #[serde(default = "default_model")]
    pub model: String,
    /// File holding the API key. Relative paths resolve against the working directory.
    #[serde(default = "default_api_key_file")]
    pub api_key_file: Option<PathBuf>,
    /// Environment variable consulted when the key file is absent or empty.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Sampling temperature.
    #[serde(default)]
    pub temperature: f32,
    /// Completion budget per call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request JSON-object output (with one plain-text retry if the provider refuses).
    #[serde(default = "default_true")]
    pub json_mode: bool,
    /// Per-call timeout in milliseconds. Unset leaves it to the HTTP client.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: None,
            model: default_model(),
            api_key_file: default_api_key_file(),
            api_key_env: default_api_key_env(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            json_mode: true,
            request_timeout_ms: None,
        }
    }
}

impl LlmConfig {
    /// The configured base URL, or the provider's default one.
    #[must_use]
    pub fn resolved_base_url(&self) -> &str {
        match (&self.base_url, self.provider) {
            (Some(url), _) => url.as_str(),
            (None, ProviderKind::Ollama) => DEFAULT_OLLAMA_URL,
            (None, _) => DEFAULT_OPENAI_URL,
        }
    }

    /// Build the configured client. The API key is looked up now but not validated.
    #[must_use]
    pub fn build_client(&self) -> LlmClient {
        let provider = match self.provider {
            ProviderKind::OpenAi => {
                let api_key = resolve_api_key(self.api_key_file.as_deref(), &self.api_key_env);
                if api_key.is_empty() {
                    warn!(
                        env = %self.api_key_env,
                        "no API key found; model calls will be rejected until one is provided"
                    );
                }
                LlmProvider::OpenAiCompatible {
                    base_url: self.resolved_base_url().to_string(),
                    api_key,
                }
            }
            ProviderKind::Ollama => LlmProvider::Ollama {
                base_url: self.resolved_base_url().to_string(),
            },
            ProviderKind::None => LlmProvider::None,
        };
        LlmClient::new(provider, self.model.clone())
    }
}

/// Memoization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Let only one caller ask the model for a given uncached input at a time.
    #[serde(default = "default_true")]
    pub single_flight: bool,
    /// Per-operation entry limit (least recently used evicted). Unset keeps everything.
    #[serde(default)]
    pub max_entries: Option<NonZeroUsize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            single_flight: true,
            max_entries: None,
        }
    }
}

/// Prompt template overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// TOML file with a `[prompt]` table (`system`, `add`, `split`).
    #[serde(default)]
    pub file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_bind() -> SocketAddr { SocketAddr::from(([127, 0, 0, 1], 8000)) }
fn default_provider() -> ProviderKind { ProviderKind::OpenAi }
fn default_model() -> String { "qwen/qwen3-32b".to_string() }
fn default_api_key_file() -> Option<PathBuf> { Some(PathBuf::from("groq_api_key.txt")) }
fn default_api_key_env() -> String { "GROQ_API_KEY".to_string() }
fn default_max_tokens() -> u32 { 30_000 }
