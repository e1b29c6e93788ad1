//! JSON API with a required token, lyrics-only. This is the classifier's
//! `lyrics-only engine` special case (`content_classifier.py`'s
//! engine override): anything this adapter returns is pinned to
//! `Lyrics@0.95` downstream regardless of the generic music/radio scoring.

use super::{check_status, MusicEngine, StatusOutcome};
use crate::error::AppError;
use crate::models::{EngineDescriptor, RawResult};
use async_trait::async_trait;
use serde::Deserialize;

const BASE_URL: &str = "https://api.genius.com/search";

pub struct GeniusEngine {
    descriptor: EngineDescriptor,
    access_token: Option<String>,
}

impl GeniusEngine {
    pub fn new(descriptor: EngineDescriptor, access_token: Option<String>) -> Self {
        Self {
            descriptor,
            access_token,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchResponseBody,
}

#[derive(Debug, Deserialize)]
struct SearchResponseBody {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    result: HitResult,
}

#[derive(Debug, Deserialize)]
struct HitResult {
    id: u64,
    title: String,
    #[serde(default)]
    primary_artist: Option<PrimaryArtist>,
    #[serde(default)]
    song_art_image_thumbnail_url: Option<String>,
    url: String,
}

#[derive(Debug, Deserialize)]
struct PrimaryArtist {
    name: String,
}

#[async_trait]
impl MusicEngine for GeniusEngine {
    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn search(&self, client: &reqwest::Client, query: &str) -> Result<Vec<RawResult>, AppError> {
        let token = self.access_token.as_ref().ok_or_else(|| AppError::EngineDisabled {
            engine: self.descriptor.id.clone(),
        })?;

        let url = format!("{BASE_URL}?q={}", urlencoding::encode(query));
        let response = client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::AdapterFatal {
                engine: self.descriptor.id.clone(),
                message: e.to_string(),
            })?;

        match check_status(response.status(), &self.descriptor.id)? {
            StatusOutcome::Proceed => {}
            StatusOutcome::EmptyResults => return Ok(Vec::new()),
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| AppError::AdapterParseError {
            engine: self.descriptor.id.clone(),
            message: e.to_string(),
        })?;

        Ok(parsed
            .response
            .hits
            .into_iter()
            .map(|hit| {
                let mut engine_data = std::collections::HashMap::new();
                engine_data.insert("genius_id".to_string(), serde_json::json!(hit.result.id));
                RawResult {
                    engine: self.descriptor.id.clone(),
                    url: hit.result.url,
                    title: hit.result.title,
                    artist: hit.result.primary_artist.map(|a| a.name),
                    thumbnail: hit.result.song_art_image_thumbnail_url,
                    external_id: Some(hit.result.id.to_string()),
                    engine_data,
                    ..Default::default()
                }
            })
            .collect())
    }
}
