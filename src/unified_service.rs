//! Unified entity/playlist service (C10): the top-level entry point that
//! ties dispatch, dedup/rank, and playlist export together, and exposes
//! universal playlists built from `UnifiedTrack`s.

use crate::dedup_rank::dedupe_and_rank;
use crate::dispatcher::Dispatcher;
use crate::error::AppError;
use crate::models::{Playlist, UnifiedTrack};

pub struct UnifiedService {
    dispatcher: Dispatcher,
}

/// Domain → engine id, for add-path c (a pasted third-party URL). Matched
/// by substring against the host, so subdomains (`m.soundcloud.com`,
/// `music.youtube.com`) resolve the same as the bare domain.
const DOMAIN_ENGINES: &[(&str, &str)] = &[
    ("musicbrainz.org", "musicbrainz"),
    ("jamendo.com", "jamendo"),
    ("tidal.com", "tidal-web"),
    ("radioparadise.com", "radio-paradise"),
    ("soundcloud.com", "soundcloud"),
    ("genius.com", "genius"),
    ("youtube.com", "youtube-music"),
    ("youtu.be", "youtube-music"),
    ("archive.org", "archive-audio"),
];

fn detect_engine_from_url(url: &str) -> Option<&'static str> {
    let lower = url.to_lowercase();
    DOMAIN_ENGINES.iter().find(|(domain, _)| lower.contains(domain)).map(|(_, engine)| *engine)
}

pub struct SearchOutcome {
    pub tracks: Vec<UnifiedTrack>,
    pub engine_status: std::collections::HashMap<String, crate::registry::EngineStatus>,
}

impl UnifiedService {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Runs the full pipeline: dispatch → classify (already done inside
    /// dispatch) → dedup/rank → slice to `limit`.
    pub async fn search(&self, query: &str, engines: &[String], limit: usize) -> Result<SearchOutcome, AppError> {
        let outcome = self.dispatcher.dispatch(query, engines).await?;
        let mut tracks = dedupe_and_rank(outcome.results);
        tracks.truncate(limit);
        Ok(SearchOutcome {
            tracks,
            engine_status: outcome.engine_status,
        })
    }

    /// Builds a universal playlist from a ranked track list (add-path a:
    /// already-ranked reference).
    pub fn build_playlist(id: &str, name: &str, tracks: &[UnifiedTrack]) -> Playlist {
        let mut playlist = Playlist::new(id, name);
        for track in tracks {
            playlist.push(track.clone());
        }
        playlist
    }

    /// Add-path b: a search query. Dispatches with `limit = 1` and adds
    /// the top-ranked result, if any.
    pub async fn add_by_query(&self, playlist: &mut Playlist, query: &str, engines: &[String]) -> Result<bool, AppError> {
        let outcome = self.search(query, engines, 1).await?;
        match outcome.tracks.into_iter().next() {
            Some(track) => {
                playlist.push(track);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Add-path c: a third-party URL. Detects the platform by domain,
    /// then runs a single-track query against just that engine so the
    /// result is pinned to the platform the user actually linked.
    pub async fn add_by_url(&self, playlist: &mut Playlist, url: &str, query: &str) -> Result<bool, AppError> {
        let engine = detect_engine_from_url(url).ok_or_else(|| AppError::InvalidInput {
            message: format!("unrecognized platform domain in url: {url}"),
        })?;
        self.add_by_query(playlist, query, &[engine.to_string()]).await
    }

    pub fn resolve_platform_url<'a>(tracks: &'a [UnifiedTrack], unified_id: &str) -> Option<&'a str> {
        const PREFERENCE_ORDER: &[&str] = &["youtube", "youtube-music", "spotify", "soundcloud", "bandcamp"];
        let track = tracks.iter().find(|t| t.unified_id == unified_id)?;
        for preferred in PREFERENCE_ORDER {
            if let Some(presence) = track.platforms.iter().find(|(engine, _)| engine.contains(preferred)) {
                return Some(presence.1.url.as_str());
            }
        }
        track.platforms.values().next().map(|p| p.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlatformPresence;
    use std::collections::HashSet;

    fn track(id: &str, platforms: &[(&str, &str)]) -> UnifiedTrack {
        UnifiedTrack {
            unified_id: id.to_string(),
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            album: None,
            platforms: platforms
                .iter()
                .map(|(engine, url)| {
                    (
                        engine.to_string(),
                        PlatformPresence {
                            url: url.to_string(),
                            source_uri: None,
                            metadata: Default::default(),
                            quality: None,
                            preview_url: None,
                            iframe_src: None,
                            thumbnail: None,
                        },
                    )
                })
                .collect(),
            genres: HashSet::new(),
            release_date: None,
            duration_ms: Some(180_000),
            popularity_score: 50.0,
            tags: HashSet::new(),
            play_count_total: 0,
            first_seen: chrono::Utc::now(),
        }
    }

    #[test]
    fn resolve_prefers_youtube_over_soundcloud() {
        let tracks = vec![track(
            "t1",
            &[("soundcloud", "https://soundcloud.example/1"), ("youtube", "https://youtube.example/1")],
        )];
        let url = UnifiedService::resolve_platform_url(&tracks, "t1");
        assert_eq!(url, Some("https://youtube.example/1"));
    }

    #[test]
    fn playlist_build_preserves_track_order() {
        let tracks = vec![track("t1", &[]), track("t2", &[])];
        let playlist = UnifiedService::build_playlist("p1", "My Playlist", &tracks);
        assert_eq!(playlist.entries[0].track.unified_id, "t1");
        assert_eq!(playlist.entries[1].track.unified_id, "t2");
    }

    #[test]
    fn detect_engine_from_url_matches_known_domains() {
        assert_eq!(detect_engine_from_url("https://soundcloud.com/artist/track"), Some("soundcloud"));
        assert_eq!(detect_engine_from_url("https://music.youtube.com/watch?v=abc"), Some("youtube-music"));
        assert_eq!(detect_engine_from_url("https://example.com/track"), None);
    }
}
