//! Comic script parsing from provider responses.
//!
//! Accepts the JSON object either inside a ` ```json` fenced block, as the
//! whole response, or as the outermost `{...}` span of surrounding prose.
//! Field names are matched leniently since providers drift from the schema.

use super::entities::{ComicContent, PanelContent};
use thiserror::Error;

/// Why a provider response is not a usable comic script
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("response contains no JSON object")]
    NoJson,

    #[error("response is missing '{0}'")]
    MissingField(&'static str),

    #[error("expected {expected} panels, got {actual}")]
    PanelCountMismatch { expected: usize, actual: usize },

    #[error("panel {0} has an empty image description")]
    EmptyDescription(usize),
}

const DESCRIPTION_KEYS: [&str; 3] = ["image_description", "imageDescription", "description"];

/// Parse a comic script, requiring exactly `expected_panels` panels
pub fn parse_comic_content(
    response: &str,
    expected_panels: usize,
) -> Result<ComicContent, ScriptError> {
    let json = extract_json(response).ok_or(ScriptError::NoJson)?;
    parse_comic_json(&json, expected_panels)
}

fn extract_json(response: &str) -> Option<serde_json::Value> {
    // ```json ... ``` blocks first
    let mut in_block = false;
    let mut current_block = String::new();
    for line in response.lines() {
        let trimmed = line.trim();
        if !in_block && (trimmed == "```json" || trimmed == "```") {
            in_block = true;
            current_block.clear();
        } else if in_block && trimmed == "```" {
            in_block = false;
            if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&current_block)
                && parsed.is_object()
            {
                return Some(parsed);
            }
        } else if in_block {
            current_block.push_str(line);
            current_block.push('\n');
        }
    }

    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(response.trim())
        && parsed.is_object()
    {
        return Some(parsed);
    }

    // Outermost {...} span
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<serde_json::Value>(&response[start..=end])
        .ok()
        .filter(|v| v.is_object())
}

fn non_empty_str(value: &serde_json::Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_dialogue(value: Option<&serde_json::Value>) -> Vec<String> {
    match value {
        Some(serde_json::Value::Array(lines)) => lines.iter().filter_map(non_empty_str).collect(),
        Some(value) => non_empty_str(value).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Parse a comic script from an already decoded JSON value.
///
/// Expected schema:
/// ```json
/// {
///   "title": "string",
///   "panels": [
///     {
///       "image_description": "string",
///       "dialogue": ["string", ...],
///       "narration": "string (optional)"
///     }
///   ]
/// }
/// ```
pub fn parse_comic_json(
    json: &serde_json::Value,
    expected_panels: usize,
) -> Result<ComicContent, ScriptError> {
    let title = json
        .get("title")
        .and_then(non_empty_str)
        .ok_or(ScriptError::MissingField("title"))?;
    let panels_json = json
        .get("panels")
        .and_then(|v| v.as_array())
        .ok_or(ScriptError::MissingField("panels"))?;

    if panels_json.len() != expected_panels {
        return Err(ScriptError::PanelCountMismatch {
            expected: expected_panels,
            actual: panels_json.len(),
        });
    }

    let mut panels = Vec::with_capacity(panels_json.len());
    for (index, panel_json) in panels_json.iter().enumerate() {
        let image_description = DESCRIPTION_KEYS
            .iter()
            .find_map(|key| panel_json.get(*key).and_then(non_empty_str))
            .ok_or(ScriptError::EmptyDescription(index + 1))?;

        panels.push(PanelContent {
            image_description,
            dialogue: parse_dialogue(panel_json.get("dialogue")),
            narration: panel_json.get("narration").and_then(non_empty_str),
        });
    }

    Ok(ComicContent { title, panels })
}
