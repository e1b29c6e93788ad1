//! Deduper & Ranker (C9), grounded on
//! `examples/original_source/orchestrator/services/music_aggregation_service.py`.
//! Groups normalized results into `UnifiedTrack`s keyed on
//! `(normalized artist, normalized title)`, merges per-platform presence,
//! and ranks by a fixed per-engine popularity weighting plus a
//! cross-platform coverage bonus.

use crate::models::{NormalizedResult, PlatformPresence, UnifiedTrack};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

static FEAT_SUBSTRING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bfeat\.|\bft\.").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const PLATFORM_WEIGHTS: &[(&str, f64)] = &[
    ("youtube", 30.0),
    ("youtube-music", 30.0),
    ("spotify", 25.0),
    ("soundcloud", 20.0),
    ("bandcamp", 15.0),
    ("deezer", 10.0),
    ("mixcloud", 10.0),
    ("genius", 5.0),
];
const DEFAULT_PLATFORM_WEIGHT: f64 = 5.0;
const COVERAGE_BONUS_PER_PLATFORM: f64 = 10.0;
const MAX_POPULARITY: f64 = 100.0;
/// `quality_score` contributes at most this many popularity points in
/// total per `UnifiedTrack`, additive on top of the platform-weight
/// base rather than summed once per contributing engine.
const MAX_QUALITY_BONUS: f64 = 10.0;

fn normalize_for_key(s: &str) -> String {
    let lower = s.to_lowercase();
    let stripped = FEAT_SUBSTRING.replace_all(&lower, "");
    WHITESPACE.replace_all(stripped.trim(), " ").to_string()
}

/// `md5(normalize(artist) + ":" + normalize(title))[0:12]`.
pub fn unified_id(artist: &str, title: &str) -> String {
    let normalized = format!("{}:{}", normalize_for_key(artist), normalize_for_key(title));
    let digest = md5::compute(normalized.as_bytes());
    format!("{digest:x}")[..12].to_string()
}

fn platform_weight(engine: &str) -> f64 {
    let lower = engine.to_lowercase();
    PLATFORM_WEIGHTS
        .iter()
        .find(|(name, _)| lower.contains(name))
        .map(|(_, weight)| *weight)
        .unwrap_or(DEFAULT_PLATFORM_WEIGHT)
}

fn popularity_score(platforms: &HashMap<String, PlatformPresence>) -> f64 {
    let base: f64 = platforms.keys().map(|p| platform_weight(p)).sum();
    let coverage_bonus = COVERAGE_BONUS_PER_PLATFORM * platforms.len() as f64;
    // Quality is capped once across the whole track rather than summed
    // once per contributing engine, so a track seen on five mediocre
    // engines doesn't out-rank one seen on two excellent ones.
    let quality_bonus: f64 = platforms
        .values()
        .filter_map(|p| p.quality)
        .map(|q| q * 10.0)
        .sum::<f64>()
        .min(MAX_QUALITY_BONUS);
    (base + coverage_bonus + quality_bonus).min(MAX_POPULARITY)
}

fn play_count_from_metadata(metadata: &HashMap<String, Value>) -> u64 {
    metadata.get("play_count").and_then(|v| v.as_u64()).unwrap_or(0)
}

/// Groups results into unified tracks, preserving first-seen insertion
/// order for the final tie-break, then ranks descending by
/// `popularity_score`.
pub fn dedupe_and_rank(results: Vec<NormalizedResult>) -> Vec<UnifiedTrack> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, UnifiedTrack> = HashMap::new();

    for result in results {
        let id = unified_id(&result.artist, &result.title);
        grouped
            .entry(id.clone())
            .and_modify(|track| merge_into(track, &result))
            .or_insert_with(|| {
                order.push(id.clone());
                new_unified_track(id.clone(), &result)
            });
    }

    for track in grouped.values_mut() {
        track.popularity_score = popularity_score(&track.platforms);
        track.play_count_total = track.platforms.values().map(|p| play_count_from_metadata(&p.metadata)).sum();
    }

    let mut tracks: Vec<UnifiedTrack> = order
        .into_iter()
        .filter_map(|id| grouped.remove(&id))
        .collect();
    tracks.sort_by(|a, b| b.popularity_score.partial_cmp(&a.popularity_score).unwrap_or(std::cmp::Ordering::Equal));
    tracks
}

fn platform_presence(result: &NormalizedResult) -> PlatformPresence {
    PlatformPresence {
        url: result.url.clone(),
        source_uri: result.external_id.clone(),
        metadata: result.metadata.clone(),
        quality: Some(result.quality_score),
        preview_url: result.preview_url.clone(),
        iframe_src: result.iframe_src.clone(),
        thumbnail: result.thumbnail.clone(),
    }
}

fn new_unified_track(id: String, result: &NormalizedResult) -> UnifiedTrack {
    let mut platforms = HashMap::new();
    platforms.insert(result.engine.clone(), platform_presence(result));
    UnifiedTrack {
        unified_id: id,
        title: result.title.clone(),
        artist: result.artist.clone(),
        album: result.album.clone(),
        platforms,
        genres: result.genres.iter().cloned().collect(),
        release_date: result.release_date.clone().or_else(|| result.year.map(|y| y.to_string())),
        duration_ms: result.duration_ms,
        popularity_score: 0.0,
        tags: Default::default(),
        play_count_total: 0,
        first_seen: chrono::Utc::now(),
    }
}

/// Last-write-wins on `platforms[engine]`, matching the original's
/// `_create_unified_tracks` merge policy, a later result from the same
/// engine replaces the earlier one rather than being ignored. Empty
/// top-level fields (`album`, `release_date`, `duration_ms`) are filled
/// from whichever merged-in result has them first; `first_seen` is set
/// once and never overwritten.
fn merge_into(track: &mut UnifiedTrack, result: &NormalizedResult) {
    track.platforms.insert(result.engine.clone(), platform_presence(result));
    if track.album.is_none() {
        track.album = result.album.clone();
    }
    if track.release_date.is_none() {
        track.release_date = result.release_date.clone().or_else(|| result.year.map(|y| y.to_string()));
    }
    if track.duration_ms.is_none() {
        track.duration_ms = result.duration_ms;
    }
    for genre in &result.genres {
        track.genres.insert(genre.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn result(engine: &str, artist: &str, title: &str) -> NormalizedResult {
        NormalizedResult {
            engine: engine.to_string(),
            engine_name: engine.to_string(),
            url: format!("https://{engine}.example/track"),
            title: title.to_string(),
            artist: artist.to_string(),
            artists: vec![artist.to_string()],
            featured_artists: vec![],
            album: None,
            duration_ms: Some(200_000),
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
            metadata: Map::new(),
            stable_key: "k".to_string(),
            content_type: None,
            confidence: None,
            base_track: None,
            quality_score: 0.5,
        }
    }

    #[test]
    fn unified_id_is_stable_across_feat_variants() {
        let a = unified_id("Daft Punk", "Around the World");
        let b = unified_id("daft punk feat. someone", "around the world");
        assert_eq!(a, b);
    }

    #[test]
    fn same_track_across_engines_merges_into_one() {
        let results = vec![
            result("youtube", "Daft Punk", "Around the World"),
            result("soundcloud", "Daft Punk", "Around the World"),
        ];
        let tracks = dedupe_and_rank(results);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].platforms.len(), 2);
    }

    #[test]
    fn ranking_is_descending_by_popularity() {
        let results = vec![
            result("genius", "Artist A", "Song A"),
            result("youtube", "Artist B", "Song B"),
            result("soundcloud", "Artist B", "Song B"),
        ];
        let tracks = dedupe_and_rank(results);
        assert_eq!(tracks[0].title, "Song B");
    }
}
