//! JSON API, no token required. Grounded on
//! `examples/original_source/engines/musicbrainz.py`: MusicBrainz
//! requires an identifying `User-Agent` but no API key, and its
//! `/recording` search endpoint returns one of a few shapes depending on
//! which entity matched.

use super::{check_status, MusicEngine, StatusOutcome};
use crate::error::AppError;
use crate::models::{EngineDescriptor, RawResult};
use async_trait::async_trait;
use serde::Deserialize;

const BASE_URL: &str = "https://musicbrainz.org/ws/2";

pub struct MusicBrainzEngine {
    descriptor: EngineDescriptor,
}

impl MusicBrainzEngine {
    pub fn new(descriptor: EngineDescriptor) -> Self {
        Self { descriptor }
    }
}

#[derive(Debug, Deserialize)]
struct RecordingSearchResponse {
    #[serde(default)]
    recordings: Vec<Recording>,
}

#[derive(Debug, Deserialize)]
struct Recording {
    id: String,
    title: String,
    #[serde(default)]
    length: Option<u64>,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<ArtistCredit>,
    #[serde(default)]
    releases: Vec<Release>,
}

#[derive(Debug, Deserialize)]
struct ArtistCredit {
    name: String,
    #[serde(default)]
    joinphrase: String,
}

#[derive(Debug, Deserialize)]
struct Release {
    title: String,
    #[serde(default)]
    date: Option<String>,
}

fn join_artist_credit(credits: &[ArtistCredit]) -> String {
    let mut out = String::new();
    for credit in credits {
        out.push_str(&credit.name);
        out.push_str(&credit.joinphrase);
    }
    out
}

#[async_trait]
impl MusicEngine for MusicBrainzEngine {
    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn search(&self, client: &reqwest::Client, query: &str) -> Result<Vec<RawResult>, AppError> {
        let url = format!(
            "{BASE_URL}/recording?query={}&fmt=json&limit=20",
            urlencoding::encode(query)
        );
        let response = client
            .get(&url)
            .header("User-Agent", "music-federate-core/0.1 (+https://example.invalid)")
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

        let parsed: RecordingSearchResponse =
            response.json().await.map_err(|e| AppError::AdapterParseError {
                engine: self.descriptor.id.clone(),
                message: e.to_string(),
            })?;

        Ok(parsed
            .recordings
            .into_iter()
            .map(|recording| RawResult {
                engine: self.descriptor.id.clone(),
                url: format!("https://musicbrainz.org/recording/{}", recording.id),
                title: recording.title,
                artist: Some(join_artist_credit(&recording.artist_credit)),
                album: recording.releases.first().map(|r| r.title.clone()),
                duration: recording.length.map(|ms| ms.to_string()),
                release_date: recording.releases.first().and_then(|r| r.date.clone()),
                mbid: Some(recording.id),
                ..Default::default()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_artist_credit_with_joinphrases() {
        let credits = vec![
            ArtistCredit {
                name: "Daft Punk".to_string(),
                joinphrase: " & ".to_string(),
            },
            ArtistCredit {
                name: "Pharrell Williams".to_string(),
                joinphrase: String::new(),
            },
        ];
        assert_eq!(join_artist_credit(&credits), "Daft Punk & Pharrell Williams");
    }
}
