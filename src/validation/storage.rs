use super::{MAX_DURATION_MS, MAX_URL_LENGTH, MIN_DURATION_MS};
use crate::models::NormalizedResult;
use once_cell::sync::Lazy;
use regex::Regex;

static ISRC_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2}[A-Z0-9]{3}\d{7}$").unwrap());

fn is_valid_isrc(raw: &str) -> bool {
    let cleaned: String = raw.chars().filter(|c| *c != '-').collect();
    ISRC_PATTERN.is_match(&cleaned.to_uppercase())
}

/// Phase C: validate a normalized result is fit to persist. Returns every
/// violation found rather than stopping at the first, matching
/// `validate_for_storage`'s `(is_valid, errors)` contract.
pub fn validate_for_storage(result: &NormalizedResult) -> Vec<String> {
    let mut errors = Vec::new();

    if result.title.trim().is_empty() {
        errors.push("title is required".to_string());
    }
    if result.artist.trim().is_empty() {
        errors.push("artist is required".to_string());
    }
    if result.url.is_empty() {
        errors.push("url is required".to_string());
    } else if result.url.len() > MAX_URL_LENGTH {
        errors.push("url exceeds maximum length".to_string());
    } else if !(result.url.starts_with("http://") || result.url.starts_with("https://")) {
        errors.push("url must be http(s)".to_string());
    }
    if let Some(ms) = result.duration_ms {
        if !(MIN_DURATION_MS..=MAX_DURATION_MS).contains(&ms) {
            errors.push(format!("duration_ms {ms} out of range"));
        }
    }
    if let Some(isrc) = &result.isrc {
        if !is_valid_isrc(isrc) {
            errors.push(format!("invalid isrc: {isrc}"));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample() -> NormalizedResult {
        NormalizedResult {
            engine: "musicbrainz".to_string(),
            url: "https://example.com/track/1".to_string(),
            title: "Around the World".to_string(),
            artist: "Daft Punk".to_string(),
            featured_artists: vec![],
            album: None,
            duration_ms: Some(200_000),
            content: "Daft Punk • 3:20".to_string(),
            thumbnail: None,
            year: None,
            genres: vec![],
            isrc: None,
            mbid: None,
            preview_url: None,
            metadata: HashMap::new(),
            stable_key: "abc123".to_string(),
            content_type: None,
            confidence: None,
        }
    }

    #[test]
    fn valid_result_has_no_errors() {
        assert!(validate_for_storage(&sample()).is_empty());
    }

    #[test]
    fn missing_title_is_flagged() {
        let mut result = sample();
        result.title = String::new();
        assert!(!validate_for_storage(&result).is_empty());
    }

    #[test]
    fn isrc_format_is_checked() {
        let mut result = sample();
        result.isrc = Some("NOT-AN-ISRC".to_string());
        let errors = validate_for_storage(&result);
        assert!(errors.iter().any(|e| e.contains("isrc")));
    }

    #[test]
    fn valid_isrc_passes() {
        let mut result = sample();
        result.isrc = Some("FRUM71505012".to_string());
        assert!(validate_for_storage(&result).is_empty());
    }
}
