//! Core types: symbols going in, elements coming out.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CraftError;

/// A named concept ("Water", "Steam"). Trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Create a symbol from caller input, stripping surrounding whitespace.
    ///
    /// # Errors
    /// Returns `CraftError::InvalidInput` if nothing is left after trimming.
    pub fn new(name: impl AsRef<str>) -> crate::error::Result<Self> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CraftError::InvalidInput("symbol must not be blank".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The symbol text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Symbol {
    type Error = CraftError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

/// Validate a list of caller-supplied names into symbols, keeping their order.
///
/// # Errors
/// Returns `CraftError::InvalidInput` if the list is empty or any entry is blank.
pub fn symbols_from<I, S>(names: I) -> crate::error::Result<Vec<Symbol>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let symbols = names
        .into_iter()
        .map(Symbol::new)
        .collect::<crate::error::Result<Vec<_>>>()?;
    if symbols.is_empty() {
        return Err(CraftError::InvalidInput("at least one symbol is required".into()));
    }
    Ok(symbols)
}

/// A symbol paired with its glyph: the result of combining symbols, and each half of a split.
///
/// Both fields are always present; an unrecoverable field is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Element {
    /// Name of the resulting concept.
    #[serde(default)]
    pub symbol: String,
    /// Glyph for the concept, conventionally a single emoji.
    #[serde(default)]
    pub emoji: String,
}

impl Element {
    /// Create an element, trimming both fields.
    #[must_use]
    pub fn new(symbol: impl AsRef<str>, emoji: impl AsRef<str>) -> Self {
        Self {
            symbol: symbol.as_ref().trim().to_string(),
            emoji: emoji.as_ref().trim().to_string(),
        }
    }

    /// The `{symbol: "", emoji: ""}` result returned when nothing could be produced.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether both fields are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbol.is_empty() && self.emoji.is_empty()
    }
}

/// Exactly two elements: the parts a symbol splits into. Serialized as a two-item JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Split(pub [Element; 2]);

impl Split {
    /// Build a split from any number of parts: the first two are kept, missing ones are empty.
    #[must_use]
    pub fn from_parts(parts: impl IntoIterator<Item = Element>) -> Self {
        let mut parts = parts.into_iter();
        let first = parts.next().unwrap_or_default();
        let second = parts.next().unwrap_or_default();
        Self([first, second])
    }

    /// Two empty elements, returned when nothing could be produced.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// First part.
    #[must_use]
    pub fn first(&self) -> &Element {
        &self.0[0]
    }

    /// Second part.
    #[must_use]
    pub fn second(&self) -> &Element {
        &self.0[1]
    }

    /// Both parts in order.
    #[must_use]
    pub fn parts(&self) -> &[Element; 2] {
        &self.0
    }
}
