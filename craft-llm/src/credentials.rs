//! API key discovery: a local key file wins, then an environment variable.

use std::path::Path;

use tracing::debug;

/// Resolve the provider API key.
///
/// Returns the trimmed contents of `file` when it exists and is non-empty, otherwise the value of
/// the `env_var` environment variable, otherwise an empty string. A missing key is not an error
/// here; the provider rejects the first call instead.
#[must_use]
pub fn resolve_api_key(file: Option<&Path>, env_var: &str) -> String {
    resolve_api_key_with(file, || std::env::var(env_var).ok())
}

/// [`resolve_api_key`] with an injectable environment lookup.
#[must_use]
pub fn resolve_api_key_with(file: Option<&Path>, env: impl FnOnce() -> Option<String>) -> String {
    if let Some(path) = file {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let key = content.trim();
                if !key.is_empty() {
                    debug!(path = %path.display(), "using API key from file");
                    return key.to_string();
                }
            }
            Err(e) => debug!(path = %path.display(), "API key file not readable: {e}"),
        }
    }
    env().map(|k| k.trim().to_string()).unwrap_or_default()
}
