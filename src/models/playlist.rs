use super::UnifiedTrack;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One slot in a universal playlist (C10): a position plus the unified
/// track occupying it, so positions stay dense after removals and the
/// full cross-source `platforms` map travels with the entry rather than
/// being lost on add.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub position: u32,
    pub track: UnifiedTrack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub entries: Vec<PlaylistEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Opaque to the core, whatever identity system sits in front of it
    /// owns the meaning of this string.
    pub owner: Option<String>,
}

impl Playlist {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            entries: Vec::new(),
            created_at: now,
            updated_at: now,
            owner: None,
        }
    }

    /// Appends at the next dense position. Removal is the caller's job
    /// via `renumber`, kept separate so batch removals don't re-walk the
    /// vector per call.
    pub fn push(&mut self, track: UnifiedTrack) {
        let position = self.entries.len() as u32;
        self.entries.push(PlaylistEntry { position, track });
        self.updated_at = Utc::now();
    }

    pub fn remove(&mut self, unified_id: &str) {
        self.entries.retain(|e| e.track.unified_id != unified_id);
        self.renumber();
        self.updated_at = Utc::now();
    }

    fn renumber(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.position = i as u32;
        }
    }

    /// Renders an M3U playlist: `#EXTM3U` header, one `#EXTINF` + URI pair
    /// per entry. `resolve_url` picks which platform URL to embed for a
    /// given unified_id (the caller owns that policy, e.g. "prefer
    /// youtube, else first platform"). An unknown duration is `-1`, the
    /// M3U convention, not `0`.
    pub fn to_m3u(&self, resolve_url: impl Fn(&str) -> Option<String>) -> String {
        let mut out = String::from("#EXTM3U\n");
        for entry in &self.entries {
            let seconds = entry.track.duration_ms.map(|ms| (ms / 1000) as i64).unwrap_or(-1);
            out.push_str(&format!(
                "#EXTINF:{seconds},{} - {}\n",
                entry.track.artist, entry.track.title
            ));
            if let Some(url) = resolve_url(&entry.track.unified_id) {
                out.push_str(&url);
                out.push('\n');
            }
        }
        out
    }

    /// `title, artist, platforms-list, first URL` per entry; `first URL`
    /// is the URL of whichever platform sorts first by engine id, kept
    /// deterministic since `platforms` is a hash map.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("title,artist,platforms,url\n");
        for entry in &self.entries {
            let mut engines: Vec<&String> = entry.track.platforms.keys().collect();
            engines.sort();
            let platforms_list = engines.iter().map(|e| e.as_str()).collect::<Vec<_>>().join(";");
            let first_url = engines
                .first()
                .and_then(|e| entry.track.platforms.get(*e))
                .map(|p| p.url.as_str())
                .unwrap_or("");
            out.push_str(&format!(
                "\"{}\",\"{}\",\"{}\",\"{}\"\n",
                entry.track.title.replace('"', "\"\""),
                entry.track.artist.replace('"', "\"\""),
                platforms_list,
                first_url
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    fn track(id: &str, title: &str, artist: &str, duration_ms: Option<u64>, platforms: &[(&str, &str)]) -> UnifiedTrack {
        UnifiedTrack {
            unified_id: id.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            album: None,
            platforms: platforms
                .iter()
                .map(|(engine, url)| {
                    (
                        engine.to_string(),
                        super::super::unified_track::PlatformPresence {
                            url: url.to_string(),
                            source_uri: None,
                            metadata: HashMap::new(),
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
            duration_ms,
            popularity_score: 0.0,
            tags: HashSet::new(),
            play_count_total: 0,
            first_seen: Utc::now(),
        }
    }

    #[test]
    fn positions_stay_dense_after_removal() {
        let mut playlist = Playlist::new("p1", "Test");
        playlist.push(track("a", "Song A", "Artist A", Some(180_000), &[]));
        playlist.push(track("b", "Song B", "Artist B", Some(200_000), &[]));
        playlist.push(track("c", "Song C", "Artist C", None, &[]));
        playlist.remove("b");
        let positions: Vec<u32> = playlist.entries.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![0, 1]);
    }

    #[test]
    fn m3u_has_extm3u_header() {
        let mut playlist = Playlist::new("p1", "Test");
        playlist.push(track("a", "Song A", "Artist A", Some(180_000), &[]));
        let m3u = playlist.to_m3u(|_| Some("https://example.com/a".to_string()));
        assert!(m3u.starts_with("#EXTM3U\n"));
        assert!(m3u.contains("#EXTINF:180,Artist A - Song A"));
    }

    #[test]
    fn m3u_uses_negative_one_for_unknown_duration() {
        let mut playlist = Playlist::new("p1", "Test");
        playlist.push(track("a", "Song A", "Artist A", None, &[]));
        let m3u = playlist.to_m3u(|_| None);
        assert!(m3u.contains("#EXTINF:-1,Artist A - Song A"));
    }

    #[test]
    fn csv_lists_platforms_and_first_url() {
        let mut playlist = Playlist::new("p1", "Test");
        playlist.push(track(
            "a",
            "Song A",
            "Artist A",
            Some(180_000),
            &[("youtube-music", "https://youtube.example/a"), ("soundcloud", "https://soundcloud.example/a")],
        ));
        let csv = playlist.to_csv();
        let data_line = csv.lines().nth(1).unwrap();
        assert!(data_line.contains("soundcloud;youtube-music"));
        assert!(data_line.contains("https://soundcloud.example/a"));
    }
}
