//! The shared `Standardize` helper: a free function every adapter's
//! raw output passes through, grounded on
//! `examples/original_source/engines/base_music.py`'s `standardize_result`
//! and its duration/artist/date helpers.

use crate::models::{NormalizedResult, RawResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static FEATURING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(?:feat\.|ft\.|featuring)\s+(.+)$").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap());
static HMS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:(\d+):)?(\d+):(\d{2})$").unwrap());
static ISO8601_DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").unwrap());
static FREEFORM_DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:(\d+)\s*h)?\s*(?:(\d+)\s*m)?\s*(?:(\d+)\s*s)?\s*$").unwrap());

/// Strips a trailing "feat./ft./featuring ..." clause from an artist
/// string and collapses whitespace.
pub fn normalize_artist(artist: &str) -> String {
    let stripped = FEATURING.replace(artist, "");
    WHITESPACE.replace_all(stripped.trim(), " ").to_string()
}

/// Pulls featured-artist names out of a `"Main feat. A, B & C"` string.
pub fn extract_featured_artists(artist: &str) -> Vec<String> {
    let Some(captures) = FEATURING.captures(artist) else {
        return Vec::new();
    };
    captures[1]
        .split(|c| c == ',' || c == '&')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parses a duration string to milliseconds, accepting every form an
/// upstream adapter is known to hand back: `HH:MM:SS`, `MM:SS`,
/// ISO-8601 `PT#H#M#S`, `"3m 45s"`, or a bare integer (seconds if under
/// 1000, else already milliseconds).
pub fn parse_duration_ms(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(n) = trimmed.parse::<u64>() {
        return Some(if n < 1000 { n * 1000 } else { n });
    }

    if let Some(captures) = HMS.captures(trimmed) {
        let hours: u64 = captures
            .get(1)
            .map(|m| m.as_str().parse().unwrap_or(0))
            .unwrap_or(0);
        let minutes: u64 = captures[2].parse().ok()?;
        let seconds: u64 = captures[3].parse().ok()?;
        return Some((hours * 3600 + minutes * 60 + seconds) * 1000);
    }

    if let Some(captures) = ISO8601_DURATION.captures(trimmed) {
        let hours: u64 = captures.get(1).map(|m| m.as_str().parse().unwrap_or(0)).unwrap_or(0);
        let minutes: u64 = captures.get(2).map(|m| m.as_str().parse().unwrap_or(0)).unwrap_or(0);
        let seconds: u64 = captures.get(3).map(|m| m.as_str().parse().unwrap_or(0)).unwrap_or(0);
        if hours == 0 && minutes == 0 && seconds == 0 {
            return None;
        }
        return Some((hours * 3600 + minutes * 60 + seconds) * 1000);
    }

    if trimmed.to_lowercase().contains('h') || trimmed.to_lowercase().contains('m') || trimmed.to_lowercase().contains('s') {
        if let Some(captures) = FREEFORM_DURATION.captures(trimmed) {
            let hours: u64 = captures.get(1).map(|m| m.as_str().parse().unwrap_or(0)).unwrap_or(0);
            let minutes: u64 = captures.get(2).map(|m| m.as_str().parse().unwrap_or(0)).unwrap_or(0);
            let seconds: u64 = captures.get(3).map(|m| m.as_str().parse().unwrap_or(0)).unwrap_or(0);
            if hours > 0 || minutes > 0 || seconds > 0 {
                return Some((hours * 3600 + minutes * 60 + seconds) * 1000);
            }
        }
    }

    None
}

/// Finds a 4-digit year (1900-2099) anywhere in a freeform date string.
pub fn extract_year(date_str: &str) -> Option<i32> {
    YEAR.captures(date_str)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn format_mmss(ms: u64) -> String {
    let total_seconds = ms / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// `md5(title + url)[0:16]`, stable across runs for the same input,
/// used to dedupe identical results surfaced twice by the same engine.
pub fn stable_key(title: &str, url: &str) -> String {
    let digest = md5::compute(format!("{title}{url}"));
    format!("{digest:x}")[..16].to_string()
}

/// Completeness-weighted score in `[0, 1]`, grounded on the original's
/// discogs-adapter quality score (a better-identified, more complete
/// result scores higher than a sparse one): weights sum to 1.0 across
/// artist/album/duration/isrc/thumbnail/preview-or-stream presence.
fn compute_quality_score(raw: &RawResult, artist: &str, duration_ms: Option<u64>) -> f64 {
    let mut score = 0.0;
    if !artist.is_empty() {
        score += 0.25;
    }
    if raw.album.is_some() {
        score += 0.15;
    }
    if duration_ms.is_some() {
        score += 0.15;
    }
    if raw.isrc.is_some() {
        score += 0.2;
    }
    if raw.thumbnail.is_some() {
        score += 0.1;
    }
    if raw.preview_url.is_some() || raw.audio_url.is_some() {
        score += 0.15;
    }
    score.min(1.0)
}

/// The shared normalization step: turns one adapter's `RawResult` into a
/// `NormalizedResult` on the fixed schema. Idempotent, standardizing an
/// already-normalized-and-reserialized result produces the same output.
/// `engine_name` is the descriptor's display name, passed in by the
/// caller rather than looked up here since `RawResult` only carries the
/// engine id.
pub fn standardize(raw: RawResult, engine_name: &str) -> NormalizedResult {
    let raw_artist = raw.artist.clone().unwrap_or_default();
    let artist = normalize_artist(&raw_artist);
    let featured_artists = extract_featured_artists(&raw_artist);
    let duration_ms = raw.duration.as_deref().and_then(parse_duration_ms);
    let year = raw.release_date.as_deref().and_then(extract_year);
    let quality_score = compute_quality_score(&raw, &artist, duration_ms);

    let mut artists = vec![artist.clone()];
    artists.extend(featured_artists.iter().cloned());

    let mut content_parts = Vec::new();
    if !artist.is_empty() {
        content_parts.push(artist.clone());
    }
    if let Some(album) = &raw.album {
        content_parts.push(format!("Album: {album}"));
    }
    if let Some(ms) = duration_ms {
        content_parts.push(format_mmss(ms));
    }
    let content = if content_parts.is_empty() {
        raw.content.clone().unwrap_or_default()
    } else {
        content_parts.join(" • ")
    };

    let metadata: HashMap<String, serde_json::Value> = raw.engine_data.clone();
    let key = stable_key(&raw.title, &raw.url);

    NormalizedResult {
        engine: raw.engine,
        engine_name: engine_name.to_string(),
        url: raw.url,
        title: raw.title,
        artist,
        artists,
        featured_artists,
        album: raw.album,
        duration_ms,
        content,
        thumbnail: raw.thumbnail,
        release_date: raw.release_date,
        year,
        genres: raw.genres,
        isrc: raw.isrc,
        mbid: raw.mbid,
        external_id: raw.external_id,
        preview_url: raw.preview_url,
        iframe_src: raw.iframe_src,
        audio_url: raw.audio_url,
        metadata,
        stable_key: key,
        content_type: None,
        confidence: None,
        base_track: None,
        quality_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_featuring_clause() {
        assert_eq!(normalize_artist("Daft Punk feat. Pharrell"), "Daft Punk");
        assert_eq!(normalize_artist("Daft Punk ft. Pharrell"), "Daft Punk");
        assert_eq!(normalize_artist("Daft Punk featuring Pharrell"), "Daft Punk");
    }

    #[test]
    fn extracts_featured_artists_list() {
        let featured = extract_featured_artists("Main feat. A, B & C");
        assert_eq!(featured, vec!["A".to_string(), "B".to_string(), "C".to_string()]);
    }

    #[test]
    fn parses_mmss() {
        assert_eq!(parse_duration_ms("3:45"), Some(225_000));
    }

    #[test]
    fn parses_hhmmss() {
        assert_eq!(parse_duration_ms("1:02:03"), Some(3_723_000));
    }

    #[test]
    fn parses_iso8601() {
        assert_eq!(parse_duration_ms("PT3M45S"), Some(225_000));
    }

    #[test]
    fn parses_freeform() {
        assert_eq!(parse_duration_ms("3m 45s"), Some(225_000));
    }

    #[test]
    fn bare_int_under_1000_is_seconds() {
        assert_eq!(parse_duration_ms("225"), Some(225_000));
    }

    #[test]
    fn bare_int_over_1000_is_milliseconds() {
        assert_eq!(parse_duration_ms("225000"), Some(225_000));
    }

    #[test]
    fn extracts_year_from_freeform_date() {
        assert_eq!(extract_year("Released March 3rd, 2001"), Some(2001));
    }

    #[test]
    fn stable_key_is_deterministic() {
        let a = stable_key("Around the World", "https://example.com/1");
        let b = stable_key("Around the World", "https://example.com/1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn standardize_is_idempotent_on_key_and_artist() {
        let raw = RawResult {
            engine: "musicbrainz".to_string(),
            url: "https://example.com/1".to_string(),
            title: "Around the World".to_string(),
            artist: Some("Daft Punk feat. Pharrell".to_string()),
            duration: Some("3:45".to_string()),
            ..Default::default()
        };
        let first = standardize(raw.clone(), "MusicBrainz");
        let second = standardize(raw, "MusicBrainz");
        assert_eq!(first.stable_key, second.stable_key);
        assert_eq!(first.artist, second.artist);
        assert_eq!(first.duration_ms, second.duration_ms);
    }
}
