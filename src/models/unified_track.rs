use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One platform's view of a unified track, the per-engine slice kept
/// after cross-source dedup (C9), enough to relink back to the source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformPresence {
    pub url: String,
    /// The engine's own canonical identifier/URI for the item, separate
    /// from the playback `url`.
    pub source_uri: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
    /// That engine's `quality_score` for this item, `None` until a
    /// result from this engine has been merged in.
    pub quality: Option<f64>,
    pub preview_url: Option<String>,
    pub iframe_src: Option<String>,
    pub thumbnail: Option<String>,
}

/// A cross-source-deduplicated track (C9): one entity per
/// (artist, title) pair, carrying every platform it was seen on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedTrack {
    /// `md5(normalize(artist) + ":" + normalize(title))[0:12]`
    pub unified_id: String,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub platforms: HashMap<String, PlatformPresence>,
    pub genres: HashSet<String>,
    pub release_date: Option<String>,
    pub duration_ms: Option<u64>,
    pub popularity_score: f64,
    pub tags: HashSet<String>,
    /// Summed across every platform presence that reported one.
    pub play_count_total: u64,
    /// Set once, at first observation, and never overwritten by later
    /// merges.
    pub first_seen: chrono::DateTime<chrono::Utc>,
}
