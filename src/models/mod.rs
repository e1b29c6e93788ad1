//! Result schema (C1): the shapes that flow through the pipeline:
//! `RawResult` from an adapter, `NormalizedResult` after standardization,
//! `UnifiedTrack` after cross-source dedup, plus display/export types.

mod engine_descriptor;
mod normalized_result;
mod playlist;
mod raw_result;
mod unified_track;

pub use engine_descriptor::{EngineCapability, EngineDescriptor};
pub use normalized_result::{ContentType, NormalizedResult};
pub use playlist::{Playlist, PlaylistEntry};
pub use raw_result::RawResult;
pub use unified_track::{PlatformPresence, UnifiedTrack};
