//! Curated feed, not a true search API. Grounded on
//! `examples/original_source/engines/radio_paradise.py`: the upstream
//! only exposes a playlist history endpoint, so "search" means fetching
//! recent history and filtering locally by substring match against
//! title/artist, this engine will always have lower recall than a real
//! search API and the classifier should weight that accordingly (it
//! self-identifies as `radio-station` via the engine-override rule).

use super::{check_status, MusicEngine, StatusOutcome};
use crate::error::AppError;
use crate::models::{EngineDescriptor, RawResult};
use async_trait::async_trait;
use serde::Deserialize;

const HISTORY_URL: &str = "https://api.radioparadise.com/api/now_playing_list";
const DEFAULT_CHANNEL: u32 = 0;

pub struct RadioParadiseEngine {
    descriptor: EngineDescriptor,
}

impl RadioParadiseEngine {
    pub fn new(descriptor: EngineDescriptor) -> Self {
        Self { descriptor }
    }
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    song: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
struct HistoryEntry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    album: Option<String>,
    #[serde(default)]
    duration: Option<u64>,
    #[serde(default)]
    cover: Option<String>,
}

#[async_trait]
impl MusicEngine for RadioParadiseEngine {
    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn search(&self, client: &reqwest::Client, query: &str) -> Result<Vec<RawResult>, AppError> {
        let url = format!("{HISTORY_URL}?chan={DEFAULT_CHANNEL}");
        let response = client.get(&url).send().await.map_err(|e| AppError::AdapterFatal {
            engine: self.descriptor.id.clone(),
            message: e.to_string(),
        })?;
        match check_status(response.status(), &self.descriptor.id)? {
            StatusOutcome::Proceed => {}
            StatusOutcome::EmptyResults => return Ok(Vec::new()),
        }
        let parsed: HistoryResponse = response.json().await.map_err(|e| AppError::AdapterParseError {
            engine: self.descriptor.id.clone(),
            message: e.to_string(),
        })?;

        let needle = query.to_lowercase();
        Ok(parsed
            .song
            .into_iter()
            .filter(|entry| {
                entry.title.to_lowercase().contains(&needle) || entry.artist.to_lowercase().contains(&needle)
            })
            .map(|entry| RawResult {
                engine: self.descriptor.id.clone(),
                url: "https://radioparadise.com".to_string(),
                title: entry.title,
                artist: Some(entry.artist),
                album: entry.album,
                duration: entry.duration.map(|s| s.to_string()),
                thumbnail: entry.cover,
                ..Default::default()
            })
            .collect())
    }
}
