use super::{MAX_CONTENT_LENGTH, MAX_TITLE_LENGTH, MAX_URL_LENGTH, MAX_DURATION_MS, MIN_DURATION_MS};
use crate::models::RawResult;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static DANGEROUS_INLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<script[^>]*>.*?</script>|javascript:|on\w+\s*=").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn sanitize_text(raw: &str, max_len: usize) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    let stripped = DANGEROUS_INLINE.replace_all(&decoded, "");
    let collapsed = WHITESPACE.replace_all(stripped.trim(), " ");
    collapsed.chars().take(max_len).collect()
}

fn sanitize_url(raw: &str) -> Option<String> {
    let lower = raw.to_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return None;
    }
    if lower.contains("javascript:") || lower.contains("data:") || lower.contains("vbscript:") {
        return None;
    }
    Some(raw.chars().take(MAX_URL_LENGTH).collect())
}

/// Recursive, one-level-deep metadata sanitation: keys truncated to 50
/// chars, string values to 500, lists capped at 20 entries (each
/// truncated to 100), nested objects capped at 10 keys with 50/100
/// truncation, matches `_sanitize_metadata`'s shape exactly.
fn sanitize_metadata_value(value: &Value, depth: u8) -> Value {
    match value {
        Value::String(s) => Value::String(s.chars().take(500).collect()),
        Value::Array(items) if depth == 0 => Value::Array(
            items
                .iter()
                .take(20)
                .map(|v| match v {
                    Value::String(s) => Value::String(s.chars().take(100).collect()),
                    other => other.clone(),
                })
                .collect(),
        ),
        Value::Object(map) if depth == 0 => {
            let mut out = serde_json::Map::new();
            for (k, v) in map.iter().take(10) {
                let key: String = k.chars().take(50).collect();
                out.insert(key, sanitize_metadata_value(v, depth + 1));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

/// Phase B: sanitize one adapter result before it enters the pipeline.
/// Never rejects outright, fields that can't be salvaged are dropped
/// (e.g. an unsafe URL becomes `None`), letting downstream stages decide
/// whether the remainder is still usable.
pub fn sanitize_raw_result(mut raw: RawResult) -> RawResult {
    raw.title = sanitize_text(&raw.title, MAX_TITLE_LENGTH);
    raw.url = sanitize_url(&raw.url).unwrap_or_default();
    raw.artist = raw.artist.map(|a| sanitize_text(&a, MAX_TITLE_LENGTH));
    raw.album = raw.album.map(|a| sanitize_text(&a, MAX_TITLE_LENGTH));
    raw.content = raw.content.map(|c| sanitize_text(&c, MAX_CONTENT_LENGTH));
    raw.thumbnail = raw.thumbnail.and_then(|u| sanitize_url(&u));
    raw.preview_url = raw.preview_url.and_then(|u| sanitize_url(&u));
    raw.duration = raw.duration.and_then(|d| validate_duration_string(&d));
    raw.engine_data = raw
        .engine_data
        .into_iter()
        .map(|(k, v)| (k.chars().take(50).collect(), sanitize_metadata_value(&v, 0)))
        .collect();
    raw
}

/// Accepts a duration string only if, once parsed to milliseconds, it
/// falls in `[MIN_DURATION_MS, MAX_DURATION_MS]`; otherwise drops it
/// rather than carrying an implausible value forward.
fn validate_duration_string(raw: &str) -> Option<String> {
    let ms = crate::engines::standardize::parse_duration_ms(raw)?;
    if (MIN_DURATION_MS..=MAX_DURATION_MS).contains(&ms) {
        Some(raw.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_tags_from_title() {
        let cleaned = sanitize_text("hello <script>alert(1)</script> world", MAX_TITLE_LENGTH);
        assert!(!cleaned.contains("script"));
    }

    #[test]
    fn rejects_javascript_url() {
        assert_eq!(sanitize_url("javascript:alert(1)"), None);
    }

    #[test]
    fn accepts_https_url() {
        assert_eq!(
            sanitize_url("https://example.com/a"),
            Some("https://example.com/a".to_string())
        );
    }

    #[test]
    fn metadata_caps_list_length() {
        let value = Value::Array((0..30).map(|i| Value::String(i.to_string())).collect());
        let sanitized = sanitize_metadata_value(&value, 0);
        assert_eq!(sanitized.as_array().unwrap().len(), 20);
    }
}
