//! Reply parsing — JSON first, then the legacy `word glyph` / `a + b` text format.
//!
//! Neither entry point can fail. Anything the JSON grammar does not match is handed
//! to the legacy grammar, and anything that cannot be recovered there becomes an
//! empty field.

use serde_json::{Map, Value};
use tracing::debug;

use crate::types::{Element, Split};

/// Separator between parts in a legacy split reply.
pub const LEGACY_PART_DELIMITER: char = '+';

/// Parse a combination reply into one element.
///
/// Accepts `{"symbol": "...", "emoji": "..."}` (emoji optional), otherwise reads the
/// text as `word... glyph`, with the last whitespace-separated token as the glyph.
#[must_use]
pub fn parse_combination(text: &str) -> Element {
    if let Some(element) = combination_from_json(text) {
        return element;
    }
    debug!(reply = text, "combination reply not in JSON form, using legacy grammar");
    word_and_glyph(text)
}

/// Parse a split reply into exactly two elements.
///
/// Accepts `{"parts": [{"symbol", "emoji"}, ...]}`, otherwise reads the text as
/// `word glyph + word glyph + ...`. Extra parts are dropped, missing parts are empty.
#[must_use]
pub fn parse_split(text: &str) -> Split {
    if let Some(split) = split_from_json(text) {
        return split;
    }
    debug!(reply = text, "split reply not in JSON form, using legacy grammar");
    Split::from_parts(
        text.split(LEGACY_PART_DELIMITER)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(word_and_glyph),
    )
}

fn combination_from_json(text: &str) -> Option<Element> {
    let value: Value = serde_json::from_str(text).ok()?;
    let object = value.as_object()?;
    let symbol = object.get("symbol")?.as_str()?;
    let emoji = match object.get("emoji") {
        None | Some(Value::Null) => "",
        Some(Value::String(emoji)) => emoji,
        Some(_) => return None,
    };
    Some(Element::new(symbol, emoji))
}

fn split_from_json(text: &str) -> Option<Split> {
    let value: Value = serde_json::from_str(text).ok()?;
    let parts = value.as_object()?.get("parts")?.as_array()?;
    Some(Split::from_parts(
        parts
            .iter()
            .take(2)
            .filter_map(Value::as_object)
            .map(element_from_object),
    ))
}

fn element_from_object(object: &Map<String, Value>) -> Element {
    Element::new(
        field_text(object.get("symbol")),
        field_text(object.get("emoji")),
    )
}

/// Missing and null are empty; strings are taken as-is; anything else is its JSON text.
fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Split on the last whitespace run: everything before is the symbol, the last token the glyph.
fn word_and_glyph(text: &str) -> Element {
    let trimmed = text.trim();
    match trimmed.rfind(char::is_whitespace) {
        Some(idx) => {
            let (word, glyph) = trimmed.split_at(idx);
            Element::new(word, glyph)
        }
        None => Element::new(trimmed, ""),
    }
}
