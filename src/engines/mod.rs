//! Engine adapter framework (C6): one `MusicEngine` impl per source,
//! each built around the class of parsing its upstream requires:
//! JSON API with/without a token, embedded JSON in HTML, CSS-selector
//! HTML scrape, or a curated feed filtered locally. `standardize` holds
//! the shared normalization logic every adapter's raw output passes
//! through before it's a `NormalizedResult` ("a free function, not a
//! superclass method").

pub mod archive_audio;
pub mod genius;
pub mod jamendo;
pub mod musicbrainz;
pub mod musictoscrape;
pub mod radio_paradise;
pub mod soundcloud;
pub mod standardize;
pub mod tidal_web;
pub mod youtube_music;

use crate::config::{ConfigError, EngineConfig};
use crate::error::AppError;
use crate::models::{EngineCapability, EngineDescriptor, RawResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;

/// What an adapter should do after inspecting an HTTP response status,
/// the non-2xx/429 split every JSON and HTML adapter shares: 429 is the
/// one status that surfaces as a structured rate-limit error, anything
/// else non-2xx just yields no results rather than a reported failure.
pub enum StatusOutcome {
    Proceed,
    EmptyResults,
}

pub fn check_status(status: StatusCode, engine_id: &str) -> Result<StatusOutcome, AppError> {
    if status.is_success() {
        return Ok(StatusOutcome::Proceed);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(AppError::RateLimited {
            engine: engine_id.to_string(),
            retry_after_seconds: None,
        });
    }
    Ok(StatusOutcome::EmptyResults)
}

/// One request cycle's worth of adapter behavior. Adapters are stateless
/// beyond their own config, concurrency, timeouts and retries are the
/// dispatcher's job (C8), not the adapter's.
#[async_trait]
pub trait MusicEngine: Send + Sync {
    fn descriptor(&self) -> &EngineDescriptor;

    /// Runs the search and returns raw results, or an `AppError` the
    /// dispatcher maps onto this engine's per-request status. Adapters
    /// must not swallow upstream errors silently, return
    /// `AdapterParseError`/`AdapterFatal` so the dispatcher can record an
    /// honest per-engine status instead of a silent empty result.
    async fn search(&self, client: &reqwest::Client, query: &str) -> Result<Vec<RawResult>, AppError>;
}

/// Builds the default engine roster with config sourced from the
/// environment, one `EngineConfig` per adapter, keyed by engine id.
/// Token-requiring engines with no key configured come up disabled
/// (`EngineConfig::from_env`), not absent, so `ENGINE_STATUS` can still
/// report on them.
pub fn default_engine_configs() -> Result<HashMap<String, EngineConfig>, ConfigError> {
    let roster: &[(&str, bool)] = &[
        ("musicbrainz", false),
        ("jamendo", true),
        ("tidal-web", false),
        ("musictoscrape", false),
        ("radio-paradise", false),
        ("soundcloud", true),
        ("genius", true),
        ("youtube-music", true),
        ("archive-audio", false),
    ];
    let mut configs = HashMap::with_capacity(roster.len());
    for (id, requires_api_key) in roster {
        configs.insert((*id).to_string(), EngineConfig::from_env(id, *requires_api_key)?);
    }
    Ok(configs)
}

/// Static descriptor table, grounded on the original's `ACTIVE_ENGINES`
/// dict of `{name, shortcut}` plus `_get_engine_features`'s capability
/// lists.
pub fn default_descriptors() -> Vec<EngineDescriptor> {
    use EngineCapability::*;
    vec![
        EngineDescriptor::new("musicbrainz", "MusicBrainz", "mb", false, vec![Search]),
        EngineDescriptor::new(
            "jamendo",
            "Jamendo Music",
            "jam",
            true,
            vec![Search, Streaming, Download, Preview],
        ),
        EngineDescriptor::new(
            "tidal-web",
            "Tidal",
            "tdw",
            false,
            vec![Search, Streaming, HighQuality, Preview],
        ),
        EngineDescriptor::new("musictoscrape", "MusicToScrape", "mts", false, vec![Search]),
        EngineDescriptor::new(
            "radio-paradise",
            "Radio Paradise",
            "rp",
            false,
            vec![Curated, HighQuality, Live],
        ),
        EngineDescriptor::new(
            "soundcloud",
            "SoundCloud",
            "sc",
            true,
            vec![Search, Streaming, Waveform, EnhancedMetadata],
        ),
        EngineDescriptor::new(
            "genius",
            "Genius Lyrics",
            "gen",
            true,
            vec![Search, Lyrics, EnhancedMetadata],
        ),
        EngineDescriptor::new(
            "youtube-music",
            "YouTube Music",
            "yt",
            true,
            vec![Search, Video, Playlist, Recommendations],
        ),
        EngineDescriptor::new(
            "archive-audio",
            "Internet Archive Audio",
            "ia",
            false,
            vec![Search, Streaming, Download],
        ),
    ]
}
