//! Embedded JSON in HTML. Grounded on
//! `examples/original_source/engines/tidal_web.py`: the search page ships
//! its results as a `window.__INITIAL_STATE__ = {...}` (or
//! `__PRELOADED_STATE__`) assignment inside a `<script>` tag rather than
//! via a JSON API, so we scan script tags for the assignment, extract the
//! balanced `{...}` that follows, and probe a handful of candidate paths
//! for the actual result list.

use super::{check_status, MusicEngine, StatusOutcome};
use crate::error::AppError;
use crate::models::{EngineDescriptor, RawResult};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

const SEARCH_URL: &str = "https://listen.tidal.com/search";

static STATE_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"window\.__(?:INITIAL_STATE|PRELOADED_STATE)__\s*=\s*(\{)").unwrap()
});

/// Extracts the first balanced `{...}` starting at `open_brace_index`.
fn extract_balanced_json(text: &str, open_brace_index: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    for (offset, &byte) in bytes[open_brace_index..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[open_brace_index..open_brace_index + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn find_embedded_state(html: &str) -> Option<Value> {
    let document = Html::parse_document(html);
    let script_selector = Selector::parse("script").ok()?;
    for script in document.select(&script_selector) {
        let text = script.text().collect::<String>();
        if let Some(captures) = STATE_ASSIGNMENT.captures(&text) {
            let brace_index = captures.get(1)?.start();
            if let Some(json_text) = extract_balanced_json(&text, brace_index) {
                if let Ok(value) = serde_json::from_str::<Value>(json_text) {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// Candidate dict-paths tried in order, matching the original's list of
/// places the results array might live depending on page version.
const CANDIDATE_PATHS: &[&[&str]] = &[
    &["search", "results"],
    &["searchResults"],
    &["search", "tracks", "items"],
];

fn locate_results(state: &Value) -> Option<&Vec<Value>> {
    for path in CANDIDATE_PATHS {
        let mut cursor = state;
        let mut found = true;
        for segment in *path {
            match cursor.get(segment) {
                Some(next) => cursor = next,
                None => {
                    found = false;
                    break;
                }
            }
        }
        if found {
            if let Some(array) = cursor.as_array() {
                return Some(array);
            }
        }
    }
    None
}

pub struct TidalWebEngine {
    descriptor: EngineDescriptor,
}

impl TidalWebEngine {
    pub fn new(descriptor: EngineDescriptor) -> Self {
        Self { descriptor }
    }
}

#[async_trait]
impl MusicEngine for TidalWebEngine {
    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn search(&self, client: &reqwest::Client, query: &str) -> Result<Vec<RawResult>, AppError> {
        let url = format!("{SEARCH_URL}?q={}", urlencoding::encode(query));
        let response = client.get(&url).send().await.map_err(|e| AppError::AdapterFatal {
            engine: self.descriptor.id.clone(),
            message: e.to_string(),
        })?;

        match check_status(response.status(), &self.descriptor.id)? {
            StatusOutcome::Proceed => {}
            StatusOutcome::EmptyResults => return Ok(Vec::new()),
        }

        let html = response.text().await.map_err(|e| AppError::AdapterFatal {
            engine: self.descriptor.id.clone(),
            message: e.to_string(),
        })?;

        let state = find_embedded_state(&html).ok_or_else(|| AppError::AdapterParseError {
            engine: self.descriptor.id.clone(),
            message: "no embedded state script found".to_string(),
        })?;
        let results = locate_results(&state).ok_or_else(|| AppError::AdapterParseError {
            engine: self.descriptor.id.clone(),
            message: "no known results path in embedded state".to_string(),
        })?;

        Ok(results
            .iter()
            .filter_map(|item| {
                let id_value = item.get("id")?;
                let id = id_value
                    .as_str()
                    .map(str::to_string)
                    .or_else(|| id_value.as_u64().map(|n| n.to_string()))?;
                let title = item.get("title").and_then(Value::as_str)?.to_string();
                let artist = item
                    .get("artist")
                    .and_then(|a| a.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Some(RawResult {
                    engine: self.descriptor.id.clone(),
                    url: format!("https://listen.tidal.com/track/{id}"),
                    title,
                    artist,
                    duration: item.get("duration").and_then(Value::as_u64).map(|s| s.to_string()),
                    ..Default::default()
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_balanced_json_ignoring_nested_braces() {
        let text = r#"window.__INITIAL_STATE__ = {"a": {"b": 1}}; more stuff"#;
        let brace = STATE_ASSIGNMENT.captures(text).unwrap().get(1).unwrap().start();
        let extracted = extract_balanced_json(text, brace).unwrap();
        assert_eq!(extracted, r#"{"a": {"b": 1}}"#);
    }

    #[test]
    fn locates_results_via_first_matching_path() {
        let state: Value = serde_json::json!({ "searchResults": [{"id": "1"}] });
        let found = locate_results(&state).unwrap();
        assert_eq!(found.len(), 1);
    }
}
