use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Classifier output (C3). `Unknown` is the default for anything that
/// doesn't clear a classification threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    MusicTrack,
    RadioStation,
    Podcast,
    Lyrics,
    Video,
    Unknown,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::MusicTrack => "music-track",
            ContentType::RadioStation => "radio-station",
            ContentType::Podcast => "podcast",
            ContentType::Lyrics => "lyrics",
            ContentType::Video => "video",
            ContentType::Unknown => "unknown",
        }
    }
}

/// Output of `Standardize` (C1): a `RawResult` normalized onto a fixed
/// schema, plus whatever the classifier later annotates it with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedResult {
    pub engine: String,
    /// Display name of the engine that produced this result, carried
    /// straight through from its `EngineDescriptor`.
    pub engine_name: String,
    pub url: String,
    pub title: String,
    /// Primary artist, `artists[0]` always equals this.
    pub artist: String,
    /// Ordered artist list, primary first, then any featured artists.
    pub artists: Vec<String>,
    pub featured_artists: Vec<String>,
    pub album: Option<String>,
    pub duration_ms: Option<u64>,
    pub content: String,
    pub thumbnail: Option<String>,
    /// ISO-8601 or year-only date string, as the engine reported it.
    pub release_date: Option<String>,
    /// Derived from `release_date` when it parses to a 4-digit year.
    pub year: Option<i32>,
    pub genres: Vec<String>,
    pub isrc: Option<String>,
    pub mbid: Option<String>,
    pub external_id: Option<String>,
    pub preview_url: Option<String>,
    pub iframe_src: Option<String>,
    pub audio_url: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
    /// `md5(title + url)[0:16]`, stable across runs for the same input.
    pub stable_key: String,
    /// Set by the classifier; `None` until `classify()` runs.
    pub content_type: Option<ContentType>,
    pub confidence: Option<f64>,
    /// `track`/`base_track` with parenthetical version markers stripped,
    /// set by the classifier's metadata-enhancement pass.
    pub base_track: Option<String>,
    /// Completeness-weighted score in `[0, 1]`, additive within a
    /// `UnifiedTrack` up to its cap rather than per-engine-summed.
    pub quality_score: f64,
}
