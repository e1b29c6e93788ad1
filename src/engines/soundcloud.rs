//! JSON API with a required token. Breadth adapter exercising
//! `engine_data` (waveform/likes/comment counts the fixed schema has no
//! column for) and the enhanced-metadata capability tag.

use super::{check_status, MusicEngine, StatusOutcome};
use crate::error::AppError;
use crate::models::{EngineDescriptor, RawResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

const BASE_URL: &str = "https://api.soundcloud.com";

pub struct SoundCloudEngine {
    descriptor: EngineDescriptor,
    client_id: Option<String>,
}

impl SoundCloudEngine {
    pub fn new(descriptor: EngineDescriptor, client_id: Option<String>) -> Self {
        Self { descriptor, client_id }
    }
}

#[derive(Debug, Deserialize)]
struct Track {
    id: u64,
    title: String,
    #[serde(default)]
    user: Option<User>,
    duration: Option<u64>,
    #[serde(default)]
    artwork_url: Option<String>,
    #[serde(default)]
    waveform_url: Option<String>,
    #[serde(default)]
    likes_count: Option<u64>,
    #[serde(default)]
    comment_count: Option<u64>,
    #[serde(default)]
    playback_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct User {
    username: String,
}

#[async_trait]
impl MusicEngine for SoundCloudEngine {
    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn search(&self, client: &reqwest::Client, query: &str) -> Result<Vec<RawResult>, AppError> {
        let client_id = self.client_id.as_ref().ok_or_else(|| AppError::EngineDisabled {
            engine: self.descriptor.id.clone(),
        })?;

        let url = format!(
            "{BASE_URL}/tracks?client_id={client_id}&q={}&limit=20",
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

        let tracks: Vec<Track> = response.json().await.map_err(|e| AppError::AdapterParseError {
            engine: self.descriptor.id.clone(),
            message: e.to_string(),
        })?;

        Ok(tracks
            .into_iter()
            .map(|track| {
                let mut engine_data = HashMap::new();
                if let Some(waveform) = &track.waveform_url {
                    engine_data.insert("waveform_url".to_string(), serde_json::json!(waveform));
                }
                if let Some(likes) = track.likes_count {
                    engine_data.insert("likes_count".to_string(), serde_json::json!(likes));
                }
                if let Some(comments) = track.comment_count {
                    engine_data.insert("comment_count".to_string(), serde_json::json!(comments));
                }
                if let Some(plays) = track.playback_count {
                    engine_data.insert("play_count".to_string(), serde_json::json!(plays));
                }
                RawResult {
                    engine: self.descriptor.id.clone(),
                    url: format!("https://soundcloud.com/tracks/{}", track.id),
                    title: track.title,
                    artist: track.user.map(|u| u.username),
                    duration: track.duration.map(|ms| ms.to_string()),
                    thumbnail: track.artwork_url,
                    external_id: Some(track.id.to_string()),
                    iframe_src: Some(format!(
                        "https://w.soundcloud.com/player/?url=https%3A%2F%2Fsoundcloud.com%2Ftracks%2F{}",
                        track.id
                    )),
                    engine_data,
                    ..Default::default()
                }
            })
            .collect())
    }
}
