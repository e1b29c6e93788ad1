//! Classifier (C3), grounded on
//! `examples/original_source/orchestrator/services/content_classifier.py`.
//! Deterministic precedence: engine override, then radio score, then
//! podcast pattern, then music score, then a video-with-metadata
//! fallback, defaulting to unknown. `filter_results` is the gate the
//! dispatcher applies before handing results to dedup/rank.

use crate::models::{ContentType, NormalizedResult};
use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};

static RADIO_TITLE_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([r"(?i)radio", r"(?i)\blive\s*stream\b", r"(?i)\bfm\b", r"(?i)\bam\b"]).unwrap()
});
static RADIO_URL_SUBSTRINGS: &[&str] = &["radioparadise", "radio-browser", "tunein", "somafm"];
static RADIO_CONTENT_PATTERNS: Lazy<RegexSet> =
    Lazy::new(|| RegexSet::new([r"(?i)24/7", r"(?i)non-?stop", r"(?i)now playing"]).unwrap());

static MUSIC_ARTIST_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^-:]+\s*[-:]\s*.+$").unwrap());
static ARTIST_DASH_TRACK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^-]+)\s*-\s*(.+)$").unwrap());
static TRACK_BY_ARTIST: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(.+)\s+by\s+([^-]+)$").unwrap());
static PARENTHETICAL_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\([^)]+\)\s*$").unwrap());
static MUSIC_ENGINE_SUBSTRINGS: &[&str] = &[
    "musicbrainz",
    "jamendo",
    "soundcloud",
    "tidal",
    "musictoscrape",
    "spotify",
    "apple music",
    "bandcamp",
    "discogs",
];
static PODCAST_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([r"(?i)\bpodcast\b", r"(?i)\bepisode\s*\d+\b", r"(?i)\bep\.?\s*\d+\b"]).unwrap()
});

const RADIO_THRESHOLD: f64 = 0.7;
const MUSIC_THRESHOLD: f64 = 0.5;
const MUSIC_DURATION_RANGE_MS: std::ops::RangeInclusive<u64> = 30_000..=900_000;
const RADIO_LONG_DURATION_MS: u64 = 3_600_000;

/// Default allowed set when a caller doesn't specify one, matches
/// `filter_results(results, allowed_types=None)`'s default.
pub fn default_allowed_types() -> Vec<ContentType> {
    vec![ContentType::MusicTrack, ContentType::Video]
}

fn engine_override(engine: &str) -> Option<(ContentType, f64)> {
    let lower = engine.to_lowercase();
    if lower.contains("radio") && (lower.contains("browser") || lower.contains("paradise")) {
        return Some((ContentType::RadioStation, 0.95));
    }
    if lower.contains("genius") {
        return Some((ContentType::Lyrics, 0.95));
    }
    None
}

fn radio_score(result: &NormalizedResult) -> f64 {
    let mut score = 0.0;
    if RADIO_TITLE_PATTERNS.is_match(&result.title) {
        score += 0.3;
    }
    let lower_url = result.url.to_lowercase();
    if RADIO_URL_SUBSTRINGS.iter().any(|s| lower_url.contains(s)) {
        score += 0.3;
    }
    if RADIO_CONTENT_PATTERNS.is_match(&result.content) {
        score += 0.2;
    }
    match result.duration_ms {
        None => score += 0.2,
        Some(ms) if ms > RADIO_LONG_DURATION_MS => score += 0.2,
        _ => {}
    }
    score
}

fn is_podcast(result: &NormalizedResult) -> bool {
    PODCAST_PATTERNS.is_match(&result.title) || PODCAST_PATTERNS.is_match(&result.content)
}

fn has_music_metadata(result: &NormalizedResult) -> bool {
    result.album.is_some() || !result.genres.is_empty() || result.isrc.is_some() || result.mbid.is_some()
}

fn music_score(result: &NormalizedResult) -> f64 {
    let mut score = 0.0;
    if MUSIC_ARTIST_TITLE.is_match(&result.title) || !result.artist.is_empty() {
        score += 0.4;
    }
    if has_music_metadata(result) {
        score += 0.3;
    }
    if result
        .duration_ms
        .map(|ms| MUSIC_DURATION_RANGE_MS.contains(&ms))
        .unwrap_or(false)
    {
        score += 0.2;
    }
    let lower_engine = result.engine.to_lowercase();
    if MUSIC_ENGINE_SUBSTRINGS.iter().any(|s| lower_engine.contains(s)) {
        score += 0.3;
    }
    score
}

/// Classifies one result, returning `(content_type, confidence)`.
pub fn classify(result: &NormalizedResult) -> (ContentType, f64) {
    if let Some(overridden) = engine_override(&result.engine) {
        return overridden;
    }
    let radio = radio_score(result);
    if radio >= RADIO_THRESHOLD {
        return (ContentType::RadioStation, radio);
    }
    if is_podcast(result) {
        return (ContentType::Podcast, 0.8);
    }
    let music = music_score(result);
    if music >= MUSIC_THRESHOLD {
        return (ContentType::MusicTrack, music);
    }
    if result.engine.to_lowercase().contains("youtube") && has_music_metadata(result) {
        return (ContentType::Video, 0.7);
    }
    (ContentType::Unknown, 0.0)
}

/// Metadata enhancement: for a `music-track` result lacking an artist,
/// parse the title as `"{artist} - {track}"` or `"{track} by {artist}"`.
/// Either way, populate `base_track` by stripping a trailing
/// parenthetical version marker (`"(Remix)"`, `"(Live)"`, ...) off the
/// track name.
fn enhance_metadata(result: &mut NormalizedResult) {
    if result.content_type != Some(ContentType::MusicTrack) {
        return;
    }

    let mut track = result.title.clone();
    if result.artist.is_empty() {
        if let Some(captures) = ARTIST_DASH_TRACK.captures(&result.title) {
            result.artist = captures[1].trim().to_string();
            track = captures[2].trim().to_string();
        } else if let Some(captures) = TRACK_BY_ARTIST.captures(&result.title) {
            track = captures[1].trim().to_string();
            result.artist = captures[2].trim().to_string();
        }
        if !result.artist.is_empty() {
            match result.artists.first_mut() {
                Some(primary) => *primary = result.artist.clone(),
                None => result.artists.push(result.artist.clone()),
            }
        }
    }

    result.base_track = Some(PARENTHETICAL_SUFFIX.replace(&track, "").trim().to_string());
}

/// Annotates every result with its classification, runs metadata
/// enhancement, and keeps only the ones in `allowed`, preserving input
/// order.
pub fn filter_results(mut results: Vec<NormalizedResult>, allowed: &[ContentType]) -> Vec<NormalizedResult> {
    for result in &mut results {
        let (content_type, confidence) = classify(result);
        result.content_type = Some(content_type);
        result.confidence = Some(confidence);
        enhance_metadata(result);
    }
    results.retain(|r| allowed.contains(&r.content_type.unwrap_or(ContentType::Unknown)));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample(engine: &str, title: &str, duration_ms: Option<u64>) -> NormalizedResult {
        NormalizedResult {
            engine: engine.to_string(),
            engine_name: engine.to_string(),
            url: "https://example.com/1".to_string(),
            title: title.to_string(),
            artist: "Daft Punk".to_string(),
            artists: vec!["Daft Punk".to_string()],
            featured_artists: vec![],
            album: Some("Discovery".to_string()),
            duration_ms,
            content: String::new(),
            thumbnail: None,
            release_date: None,
            year: None,
            genres: vec![],
            isrc: None,
            mbid: None,
            external_id: None,
            preview_url: None,
            iframe_src: None,
            audio_url: None,
            metadata: HashMap::new(),
            stable_key: "key".to_string(),
            content_type: None,
            confidence: None,
            base_track: None,
            quality_score: 0.5,
        }
    }

    #[test]
    fn enhance_metadata_splits_artist_dash_track_title() {
        let mut result = sample("musicbrainz", "Daft Punk - Around the World", Some(225_000));
        result.artist = String::new();
        result.artists = vec![];
        let (content_type, confidence) = classify(&result);
        result.content_type = Some(content_type);
        result.confidence = Some(confidence);
        enhance_metadata(&mut result);
        assert_eq!(result.artist, "Daft Punk");
        assert_eq!(result.base_track, Some("Around the World".to_string()));
    }

    #[test]
    fn enhance_metadata_strips_parenthetical_version_marker() {
        let mut result = sample("musicbrainz", "Around the World (Live)", Some(225_000));
        result.content_type = Some(ContentType::MusicTrack);
        enhance_metadata(&mut result);
        assert_eq!(result.base_track, Some("Around the World".to_string()));
    }

    #[test]
    fn genius_is_lyrics_via_engine_override() {
        let result = sample("genius", "Around the World lyrics", None);
        let (content_type, confidence) = classify(&result);
        assert_eq!(content_type, ContentType::Lyrics);
        assert_eq!(confidence, 0.95);
    }

    #[test]
    fn music_track_scores_above_threshold() {
        let result = sample("musicbrainz", "Daft Punk - Around the World", Some(225_000));
        let (content_type, _) = classify(&result);
        assert_eq!(content_type, ContentType::MusicTrack);
    }

    #[test]
    fn radio_station_by_title_and_url_pattern() {
        let mut result = sample("custom-radio", "Live Stream FM Radio", None);
        result.url = "https://radioparadise.com/mix".to_string();
        result.content = "24/7 now playing".to_string();
        let (content_type, confidence) = classify(&result);
        assert_eq!(content_type, ContentType::RadioStation);
        assert!(confidence >= RADIO_THRESHOLD);
    }

    #[test]
    fn default_allowed_types_excludes_lyrics() {
        let allowed = default_allowed_types();
        assert!(!allowed.contains(&ContentType::Lyrics));
        assert!(allowed.contains(&ContentType::MusicTrack));
    }

    #[test]
    fn filter_results_preserves_order() {
        let results = vec![
            sample("musicbrainz", "Daft Punk - Around the World", Some(225_000)),
            sample("musicbrainz", "Daft Punk - One More Time", Some(320_000)),
        ];
        let filtered = filter_results(results, &default_allowed_types());
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].title, "Daft Punk - Around the World");
    }
}
