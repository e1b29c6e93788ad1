use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What an adapter hands back before standardization, a near-verbatim
/// transcription of whatever that engine's API/HTML gave us, with only
/// enough shape to carry it through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RawResult {
    pub engine: String,
    pub url: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub content: Option<String>,
    pub duration: Option<String>,
    pub thumbnail: Option<String>,
    pub release_date: Option<String>,
    pub genres: Vec<String>,
    pub isrc: Option<String>,
    pub mbid: Option<String>,
    pub preview_url: Option<String>,
    /// The engine's own opaque identifier for the item, separate from
    /// `mbid` (MusicBrainz-specific) and the URL.
    pub external_id: Option<String>,
    /// Embeddable player URL, set by the engines that expose one
    /// (`youtube-music`, `archive-audio`, `soundcloud`, ...).
    pub iframe_src: Option<String>,
    /// Direct, playable audio stream URL, when the engine exposes one
    /// distinct from `preview_url`.
    pub audio_url: Option<String>,
    /// Catch-all for fields a given engine class exposes that don't map
    /// onto the fixed columns above (matches the original's `engine_data`).
    #[serde(default)]
    pub engine_data: HashMap<String, serde_json::Value>,
}
