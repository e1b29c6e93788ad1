//! Interaction log (C11): an append-only record of search/playback
//! interactions, behind a trait so the sink (Redis stream, stdout,
//! whatever the eventual deployment wants) is swappable without touching
//! callers, persistence schema beyond this is out of scope.

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Interaction {
    Search {
        query: String,
        engines: Vec<String>,
        result_count: usize,
    },
    PlaylistAdd {
        playlist_id: String,
        unified_id: String,
    },
    Play {
        unified_id: String,
        engine: String,
    },
}

#[async_trait]
pub trait InteractionSink: Send + Sync {
    async fn record(&self, interaction: Interaction);
}

/// Default sink: structured `tracing` events. A deployment that wants
/// durable interaction history swaps this for a Redis-stream-backed
/// sink without touching any caller.
pub struct TracingInteractionSink;

#[async_trait]
impl InteractionSink for TracingInteractionSink {
    async fn record(&self, interaction: Interaction) {
        match &interaction {
            Interaction::Search {
                query,
                engines,
                result_count,
            } => {
                tracing::info!(query, ?engines, result_count, "search interaction");
            }
            Interaction::PlaylistAdd { playlist_id, unified_id } => {
                tracing::info!(playlist_id, unified_id, "playlist add interaction");
            }
            Interaction::Play { unified_id, engine } => {
                tracing::info!(unified_id, engine, "play interaction");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tracing_sink_accepts_every_variant() {
        let sink = TracingInteractionSink;
        sink.record(Interaction::Search {
            query: "daft punk".to_string(),
            engines: vec!["musicbrainz".to_string()],
            result_count: 3,
        })
        .await;
        sink.record(Interaction::Play {
            unified_id: "abc".to_string(),
            engine: "youtube".to_string(),
        })
        .await;
    }
}
