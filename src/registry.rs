//! Registry (C7): owns the configured engine roster, their descriptors,
//! and exposes `ENGINE_STATUS`/`FeatureReport()`. The dispatcher
//! borrows from here rather than owning adapters itself.

use crate::config::EngineConfig;
use crate::engines::{
    archive_audio::ArchiveAudioEngine, default_descriptors, genius::GeniusEngine, jamendo::JamendoEngine,
    musicbrainz::MusicBrainzEngine, musictoscrape::MusicToScrapeEngine, radio_paradise::RadioParadiseEngine,
    soundcloud::SoundCloudEngine, tidal_web::TidalWebEngine, youtube_music::YoutubeMusicEngine, MusicEngine,
};
use crate::models::EngineDescriptor;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    Completed,
    CacheHit,
    Timeout,
    RateLimited,
    Failed,
    Disabled,
}

pub struct Registry {
    adapters: HashMap<String, Arc<dyn MusicEngine>>,
    configs: HashMap<String, EngineConfig>,
}

impl Registry {
    /// Builds a registry from an arbitrary adapter/config roster, the
    /// seam `with_default_engines` builds on top of and that a custom
    /// composition root (or a test standing up a fake engine) can use
    /// directly.
    pub fn new(adapters: HashMap<String, Arc<dyn MusicEngine>>, configs: HashMap<String, EngineConfig>) -> Self {
        Self { adapters, configs }
    }

    /// Builds the default roster, wiring each adapter to its
    /// `EngineConfig` (api key / enabled flag) and leaving
    /// token-requiring engines with no key configured out of the
    /// queryable set while keeping their descriptor visible in
    /// `ENGINE_STATUS`.
    pub fn with_default_engines(configs: HashMap<String, EngineConfig>) -> Self {
        let descriptors: HashMap<String, EngineDescriptor> =
            default_descriptors().into_iter().map(|d| (d.id.clone(), d)).collect();
        let mut adapters: HashMap<String, Arc<dyn MusicEngine>> = HashMap::new();

        let get = |id: &str| descriptors.get(id).cloned().expect("descriptor registered");
        let key_for = |id: &str| configs.get(id).and_then(|c| c.api_key.clone());

        adapters.insert(
            "musicbrainz".to_string(),
            Arc::new(MusicBrainzEngine::new(get("musicbrainz"))),
        );
        adapters.insert(
            "jamendo".to_string(),
            Arc::new(JamendoEngine::new(get("jamendo"), key_for("jamendo"))),
        );
        adapters.insert(
            "tidal-web".to_string(),
            Arc::new(TidalWebEngine::new(get("tidal-web"))),
        );
        adapters.insert(
            "musictoscrape".to_string(),
            Arc::new(MusicToScrapeEngine::new(get("musictoscrape"))),
        );
        adapters.insert(
            "radio-paradise".to_string(),
            Arc::new(RadioParadiseEngine::new(get("radio-paradise"))),
        );
        adapters.insert(
            "soundcloud".to_string(),
            Arc::new(SoundCloudEngine::new(get("soundcloud"), key_for("soundcloud"))),
        );
        adapters.insert(
            "genius".to_string(),
            Arc::new(GeniusEngine::new(get("genius"), key_for("genius"))),
        );
        adapters.insert(
            "youtube-music".to_string(),
            Arc::new(YoutubeMusicEngine::new(get("youtube-music"), key_for("youtube-music"))),
        );
        adapters.insert(
            "archive-audio".to_string(),
            Arc::new(ArchiveAudioEngine::new(get("archive-audio"))),
        );

        Self { adapters, configs }
    }

    pub fn known_engine_ids(&self) -> Vec<String> {
        self.adapters.keys().cloned().collect()
    }

    pub fn adapter(&self, id: &str) -> Option<Arc<dyn MusicEngine>> {
        self.adapters.get(id).cloned()
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.configs.get(id).map(|c| c.enabled).unwrap_or(false)
    }

    pub fn config(&self, id: &str) -> Option<&EngineConfig> {
        self.configs.get(id)
    }

    /// `ENGINE_STATUS`/`FeatureReport()`:
    /// descriptor plus whether it's currently enabled.
    pub fn feature_report(&self) -> Vec<(EngineDescriptor, bool)> {
        self.adapters
            .values()
            .map(|adapter| (adapter.descriptor().clone(), self.is_enabled(&adapter.descriptor().id)))
            .collect()
    }
}
