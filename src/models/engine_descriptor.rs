use serde::{Deserialize, Serialize};

/// Capability tags surfaced by `FeatureReport()` (C7), carried over
/// from the original's per-engine feature lists (`lyrics`, `streaming`,
/// `waveform`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineCapability {
    Search,
    Lyrics,
    Streaming,
    Waveform,
    Preview,
    Download,
    Purchase,
    EnhancedMetadata,
    Curated,
    HighQuality,
    Live,
    Video,
    Playlist,
    Recommendations,
    Marketplace,
}

/// Static registration data for one engine (C6/C7): display name,
/// shortcut, and the class of adapter it is, plus its capability vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineDescriptor {
    pub id: String,
    pub name: String,
    pub shortcut: String,
    pub requires_api_key: bool,
    pub capabilities: Vec<EngineCapability>,
}

impl EngineDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        shortcut: impl Into<String>,
        requires_api_key: bool,
        capabilities: Vec<EngineCapability>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            shortcut: shortcut.into(),
            requires_api_key,
            capabilities,
        }
    }
}
