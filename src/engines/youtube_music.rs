//! JSON API with a required token, video-classed engine. Grounded on
//! `examples/original_source/engines/youtube_music.py`: queries the
//! YouTube Data API v3 `search` endpoint pinned to the Music category,
//! strips common title-suffix noise ("(Official Video)" etc.), and
//! splits `"Artist - Title"` style titles when no structured artist
//! field is available.

use super::{check_status, MusicEngine, StatusOutcome};
use crate::error::AppError;
use crate::models::{EngineDescriptor, RawResult};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const MUSIC_CATEGORY_ID: &str = "10";

static TITLE_SUFFIX_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*[\(\[](official\s*(video|audio|music\s*video)?|lyrics?|hd|4k)[\)\]]\s*$").unwrap()
});
static ARTIST_TITLE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^-:]+)\s*[-:]\s*(.+)$").unwrap());

pub struct YoutubeMusicEngine {
    descriptor: EngineDescriptor,
    api_key: Option<String>,
}

impl YoutubeMusicEngine {
    pub fn new(descriptor: EngineDescriptor, api_key: Option<String>) -> Self {
        Self { descriptor, api_key }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct ItemId {
    #[serde(rename = "videoId")]
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(rename = "channelTitle")]
    channel_title: String,
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    #[serde(default)]
    maxres: Option<Thumbnail>,
    #[serde(default)]
    high: Option<Thumbnail>,
    #[serde(default)]
    medium: Option<Thumbnail>,
    #[serde(default)]
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

fn best_thumbnail(thumbnails: &Thumbnails) -> Option<String> {
    thumbnails
        .maxres
        .as_ref()
        .or(thumbnails.high.as_ref())
        .or(thumbnails.medium.as_ref())
        .or(thumbnails.default.as_ref())
        .map(|t| t.url.clone())
}

fn clean_title(raw: &str) -> String {
    TITLE_SUFFIX_NOISE.replace(raw, "").trim().to_string()
}

fn split_artist_title(title: &str) -> (Option<String>, String) {
    if let Some(captures) = ARTIST_TITLE_SPLIT.captures(title) {
        (Some(captures[1].trim().to_string()), captures[2].trim().to_string())
    } else {
        (None, title.to_string())
    }
}

#[async_trait]
impl MusicEngine for YoutubeMusicEngine {
    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn search(&self, client: &reqwest::Client, query: &str) -> Result<Vec<RawResult>, AppError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| AppError::EngineDisabled {
            engine: self.descriptor.id.clone(),
        })?;

        let url = format!(
            "{BASE_URL}?part=snippet&type=video&videoCategoryId={MUSIC_CATEGORY_ID}&videoEmbeddable=true&safeSearch=none&q={}&key={api_key}",
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
            .items
            .into_iter()
            .map(|item| {
                let cleaned_title = clean_title(&item.snippet.title);
                let (split_artist, title) = split_artist_title(&cleaned_title);
                RawResult {
                    engine: self.descriptor.id.clone(),
                    url: format!("https://www.youtube.com/embed/{}", item.id.video_id),
                    title,
                    artist: split_artist.or(Some(item.snippet.channel_title)),
                    thumbnail: best_thumbnail(&item.snippet.thumbnails),
                    external_id: Some(item.id.video_id.clone()),
                    iframe_src: Some(format!("https://www.youtube.com/embed/{}", item.id.video_id)),
                    ..Default::default()
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_official_video_suffix() {
        assert_eq!(clean_title("Around the World (Official Video)"), "Around the World");
    }

    #[test]
    fn splits_artist_title_on_dash() {
        let (artist, title) = split_artist_title("Daft Punk - Around the World");
        assert_eq!(artist, Some("Daft Punk".to_string()));
        assert_eq!(title, "Around the World");
    }
}
