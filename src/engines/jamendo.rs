//! JSON API with a required token. Jamendo's `/tracks` endpoint needs a
//! `client_id`; an engine with no key configured never reaches
//! `search()` (the dispatcher skips disabled engines), but `search`
//! still defends against a key going missing mid-process.

use super::{check_status, MusicEngine, StatusOutcome};
use crate::error::AppError;
use crate::models::{EngineDescriptor, RawResult};
use async_trait::async_trait;
use serde::Deserialize;

const BASE_URL: &str = "https://api.jamendo.com/v3.0";

pub struct JamendoEngine {
    descriptor: EngineDescriptor,
    client_id: Option<String>,
}

impl JamendoEngine {
    pub fn new(descriptor: EngineDescriptor, client_id: Option<String>) -> Self {
        Self { descriptor, client_id }
    }
}

#[derive(Debug, Deserialize)]
struct TracksResponse {
    #[serde(default)]
    results: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct Track {
    id: String,
    name: String,
    artist_name: String,
    #[serde(default)]
    album_name: Option<String>,
    duration: Option<u64>,
    #[serde(default)]
    releasedate: Option<String>,
    #[serde(default)]
    audiodownload: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

#[async_trait]
impl MusicEngine for JamendoEngine {
    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn search(&self, client: &reqwest::Client, query: &str) -> Result<Vec<RawResult>, AppError> {
        let client_id = self.client_id.as_ref().ok_or_else(|| AppError::EngineDisabled {
            engine: self.descriptor.id.clone(),
        })?;

        let url = format!(
            "{BASE_URL}/tracks?client_id={client_id}&format=json&limit=20&search={}",
            urlencoding::encode(query)
        );
        let response = client.get(&url).send().await.map_err(|e| AppError::AdapterFatal {
            engine: self.descriptor.id.clone(),
            message: e.to_string(),
        })?;

        match check_status(response.status(), &self.descriptor.id)? {
            StatusOutcome::Proceed => {}
            StatusOutcome::EmptyResults => return Ok(Vec::new()),
        }

        let parsed: TracksResponse = response.json().await.map_err(|e| AppError::AdapterParseError {
            engine: self.descriptor.id.clone(),
            message: e.to_string(),
        })?;

        Ok(parsed
            .results
            .into_iter()
            .map(|track| RawResult {
                engine: self.descriptor.id.clone(),
                url: format!("https://www.jamendo.com/track/{}", track.id),
                title: track.name,
                artist: Some(track.artist_name),
                album: track.album_name,
                duration: track.duration.map(|s| s.to_string()),
                release_date: track.releasedate,
                preview_url: track.audiodownload.clone(),
                audio_url: track.audiodownload,
                thumbnail: track.image,
                external_id: Some(track.id.clone()),
                ..Default::default()
            })
            .collect())
    }
}
