//! JSON API, no token required, breadth adapter for the Internet
//! Archive's `advancedsearch` endpoint scoped to the `audio` media type.

use super::{check_status, MusicEngine, StatusOutcome};
use crate::error::AppError;
use crate::models::{EngineDescriptor, RawResult};
use async_trait::async_trait;
use serde::Deserialize;

const BASE_URL: &str = "https://archive.org/advancedsearch.php";

pub struct ArchiveAudioEngine {
    descriptor: EngineDescriptor,
}

impl ArchiveAudioEngine {
    pub fn new(descriptor: EngineDescriptor) -> Self {
        Self { descriptor }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: ResponseBody,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    docs: Vec<Doc>,
}

#[derive(Debug, Deserialize)]
struct Doc {
    identifier: String,
    title: String,
    #[serde(default)]
    creator: Option<CreatorField>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CreatorField {
    Single(String),
    Many(Vec<String>),
}

impl CreatorField {
    fn first(&self) -> Option<String> {
        match self {
            CreatorField::Single(name) => Some(name.clone()),
            CreatorField::Many(names) => names.first().cloned(),
        }
    }
}

#[async_trait]
impl MusicEngine for ArchiveAudioEngine {
    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn search(&self, client: &reqwest::Client, query: &str) -> Result<Vec<RawResult>, AppError> {
        let url = format!(
            "{BASE_URL}?q={}+AND+mediatype%3Aaudio&fl[]=identifier&fl[]=title&fl[]=creator&fl[]=date&rows=20&output=json",
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
        let parsed: SearchResponse = response.json().await.map_err(|e| AppError::AdapterParseError {
            engine: self.descriptor.id.clone(),
            message: e.to_string(),
        })?;

        Ok(parsed
            .response
            .docs
            .into_iter()
            .map(|doc| RawResult {
                engine: self.descriptor.id.clone(),
                url: format!("https://archive.org/details/{}", doc.identifier),
                title: doc.title,
                artist: doc.creator.and_then(|c| c.first()),
                release_date: doc.date,
                external_id: Some(doc.identifier.clone()),
                iframe_src: Some(format!("https://archive.org/embed/{}", doc.identifier)),
                ..Default::default()
            })
            .collect())
    }
}
