//! Prompt templates for the add and split operations.
//!
//! The built-in templates ask for a single JSON object and show one worked
//! example. A TOML file can replace any of them without a rebuild.

use std::path::Path;

use craft_llm::ChatMessage;
use serde::Deserialize;

use crate::error::{CraftError, Result};
use crate::types::Symbol;

/// System turn shared by both operations.
pub const SYSTEM: &str = "You are an API that returns JSON.";

/// Delimiter placed between symbols in the add prompt.
pub const SYMBOL_DELIMITER: &str = "+";

/// User turn for combining symbols. `{symbols}` is the `+`-joined input.
pub const ADD_USER: &str = r#"Combine the following symbols: {symbols}

Return a single JSON object with two keys: "symbol" and "emoji". Do not add any other text.

Example for "Water" + "Fire":
{
  "symbol": "Steam",
  "emoji": "💨"
}"#;

/// User turn for splitting a symbol. `{symbol}` is the input.
pub const SPLIT_USER: &str = r#"Split the following symbol into two parts: {symbol}

Return a single JSON object with one key: "parts". The value should be a list of two objects, each with "symbol" and "emoji" keys. Do not add any other text.

Example for "Steam":
{
  "parts": [
    {
      "symbol": "Water",
      "emoji": "💧"
    },
    {
      "symbol": "Fire",
      "emoji": "🔥"
    }
  ]
}"#;

/// Simple template interpolation for prompts.
///
/// Replaces `{key}` with the corresponding value. Inserted values are not re-scanned.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

/// Build the add prompt using the built-in templates.
#[must_use]
pub fn build_add_prompt(symbols: &[Symbol]) -> Vec<ChatMessage> {
    PromptSet::builtin().add(symbols)
}

/// Build the split prompt using the built-in templates.
#[must_use]
pub fn build_split_prompt(symbol: &Symbol) -> Vec<ChatMessage> {
    PromptSet::builtin().split(symbol)
}

/// The three templates the pipeline renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// System turn.
    pub system: String,
    /// Add user turn, with a `{symbols}` placeholder.
    pub add: String,
    /// Split user turn, with a `{symbol}` placeholder.
    pub split: String,
}

/// `[prompt]` section of a prompt override file. Absent keys keep the built-in text.
#[derive(Debug, Deserialize)]
struct TomlPromptFile {
    #[serde(default)]
    prompt: TomlPromptData,
}

#[derive(Debug, Default, Deserialize)]
struct TomlPromptData {
    system: Option<String>,
    add: Option<String>,
    split: Option<String>,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptSet {
    /// The compiled-in templates.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            system: SYSTEM.into(),
            add: ADD_USER.into(),
            split: SPLIT_USER.into(),
        }
    }

    /// Parse overrides from TOML text.
    ///
    /// # Errors
    /// Returns `CraftError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let parsed: TomlPromptFile =
            toml::from_str(toml_str).map_err(|e| CraftError::Config(e.to_string()))?;
        let d = parsed.prompt;
        let builtin = Self::builtin();
        Ok(Self {
            system: d.system.unwrap_or(builtin.system),
            add: d.add.unwrap_or(builtin.add),
            split: d.split.unwrap_or(builtin.split),
        })
    }

    /// Load overrides from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Messages asking the model to combine `symbols`, in order.
    #[must_use]
    pub fn add(&self, symbols: &[Symbol]) -> Vec<ChatMessage> {
        let joined = symbols
            .iter()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(SYMBOL_DELIMITER);
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(render_template(&self.add, &[("symbols", joined.as_str())])),
        ]
    }

    /// Messages asking the model to split `symbol` in two.
    #[must_use]
    pub fn split(&self, symbol: &Symbol) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(render_template(&self.split, &[("symbol", symbol.as_str())])),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use craft_llm::Role;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).expect("valid symbol")
    }

    #[test]
    fn template_rendering_works() {
        let rendered = render_template("Combine {symbols} now", &[("symbols", "Water+Fire")]);
        assert_eq!(rendered, "Combine Water+Fire now");
    }

    #[test]
    fn template_leaves_json_braces_alone() {
        let rendered = render_template(ADD_USER, &[("symbols", "A+B")]);
        assert!(rendered.contains("\"symbol\": \"Steam\""));
        assert!(rendered.contains("{\n  \"symbol\""));
    }

    #[test]
    fn add_prompt_joins_in_order() {
        let msgs = build_add_prompt(&[sym("Water"), sym("Fire"), sym("Earth")]);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[0].content, SYSTEM);
        assert_eq!(msgs[1].role, Role::User);
        assert!(msgs[1].content.starts_with("Combine the following symbols: Water+Fire+Earth\n"));
        assert!(!msgs[1].content.contains("{symbols}"));
    }

    #[test]
    fn add_prompt_is_order_sensitive() {
        let a = build_add_prompt(&[sym("Water"), sym("Fire")]);
        let b = build_add_prompt(&[sym("Fire"), sym("Water")]);
        assert_ne!(a, b);
    }

    #[test]
    fn split_prompt_mentions_parts_and_symbol() {
        let msgs = build_split_prompt(&sym("Steam"));
        assert_eq!(msgs[0].content, SYSTEM);
        assert!(msgs[1].content.starts_with("Split the following symbol into two parts: Steam\n"));
        assert!(msgs[1].content.contains("\"parts\""));
        assert!(!msgs[1].content.contains("{symbol}"));
    }

    #[test]
    fn prompts_are_deterministic() {
        assert_eq!(build_split_prompt(&sym("Mud")), build_split_prompt(&sym("Mud")));
    }

    #[test]
    fn toml_overrides_individual_templates() {
        let set = PromptSet::from_toml(
            r#"
            [prompt]
            add = "Merge {symbols}. JSON with symbol and emoji."
            "#,
        )
        .expect("valid toml");
        assert_eq!(set.system, SYSTEM);
        assert_eq!(set.split, SPLIT_USER);
        let msgs = set.add(&[sym("A"), sym("B")]);
        assert_eq!(msgs[1].content, "Merge A+B. JSON with symbol and emoji.");
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = PromptSet::from_toml("[prompt\nadd = 1").expect_err("invalid");
        assert!(matches!(err, CraftError::Config(_)));
    }

    #[test]
    fn from_file_reads_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prompts.toml");
        std::fs::write(&path, "[prompt]\nsystem = \"Reply with JSON only.\"\n").expect("write");
        let set = PromptSet::from_file(&path).expect("load");
        assert_eq!(set.system, "Reply with JSON only.");
    }
}
