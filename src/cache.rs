//! Cache (C4), grounded on
//! `examples/original_source/music/cache/music_cache.py`: Redis-backed,
//! JSON-encoded `NormalizedResult` arrays, optionally zlib-equivalent
//! compressed via `flate2`. A corrupted stored value is treated as a
//! miss rather than propagated as an error, and a compression failure on
//! write falls back to storing the identity-encoded bytes, matching the
//! original's defensive `try/except` around `zlib`.

use crate::config::CacheConfig;
use crate::error::AppError;
use crate::models::NormalizedResult;
use deadpool_redis::{redis::AsyncCommands, Pool};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

pub struct MusicCache {
    pool: Pool,
    config: CacheConfig,
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub enabled: bool,
    pub used_memory: Option<String>,
    pub connected_clients: Option<u64>,
    pub total_keys: Option<u64>,
    pub hit_rate: Option<f64>,
}

impl MusicCache {
    pub fn new(pool: Pool, config: CacheConfig) -> Self {
        Self { pool, config }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.config.key_prefix, key)
    }

    fn compress(&self, bytes: &[u8]) -> Vec<u8> {
        if !self.config.compression {
            return bytes.to_vec();
        }
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        if encoder.write_all(bytes).is_err() {
            return bytes.to_vec();
        }
        encoder.finish().unwrap_or_else(|_| bytes.to_vec())
    }

    /// Decompresses, falling back to the raw bytes unchanged if they
    /// don't look like a zlib stream, covers values written before
    /// compression was enabled, or with it disabled.
    fn decompress(&self, bytes: &[u8]) -> Vec<u8> {
        if !self.config.compression {
            return bytes.to_vec();
        }
        let mut decoder = ZlibDecoder::new(bytes);
        let mut out = Vec::new();
        match decoder.read_to_end(&mut out) {
            Ok(_) => out,
            Err(_) => bytes.to_vec(),
        }
    }

    /// Returns `None` on a miss or on a corrupted stored value, callers
    /// treat both the same way (re-fetch from the engines).
    pub async fn get(&self, key: &str) -> Result<Option<Vec<NormalizedResult>>, AppError> {
        let mut conn = self.pool.get().await.map_err(|e| AppError::StoreUnavailable {
            store: format!("redis pool: {e}"),
        })?;
        let raw: Option<Vec<u8>> = conn.get(self.full_key(key)).await?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let decompressed = self.decompress(&raw);
        match serde_json::from_slice::<Vec<NormalizedResult>>(&decompressed) {
            Ok(results) => Ok(Some(results)),
            Err(_) => Ok(None),
        }
    }

    pub async fn set_ex(&self, key: &str, ttl_seconds: u64, results: &[NormalizedResult]) -> Result<(), AppError> {
        let mut conn = self.pool.get().await.map_err(|e| AppError::StoreUnavailable {
            store: format!("redis pool: {e}"),
        })?;
        let encoded = serde_json::to_vec(results)?;
        let compressed = self.compress(&encoded);
        let _: () = conn.set_ex(self.full_key(key), compressed, ttl_seconds).await?;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<(), AppError> {
        let mut conn = self.pool.get().await.map_err(|e| AppError::StoreUnavailable {
            store: format!("redis pool: {e}"),
        })?;
        let _: () = conn.del(self.full_key(key)).await?;
        Ok(())
    }

    /// Cache statistics from Redis `INFO`, matching
    /// `MusicCache.get_stats()`'s field set.
    pub async fn stats(&self) -> Result<CacheStats, AppError> {
        if !self.config.enabled {
            return Ok(CacheStats {
                enabled: false,
                used_memory: None,
                connected_clients: None,
                total_keys: None,
                hit_rate: None,
            });
        }
        let mut conn = self.pool.get().await.map_err(|e| AppError::StoreUnavailable {
            store: format!("redis pool: {e}"),
        })?;
        let info: String = deadpool_redis::redis::cmd("INFO")
            .query_async(&mut conn)
            .await
            .unwrap_or_default();
        Ok(CacheStats {
            enabled: true,
            used_memory: parse_info_field(&info, "used_memory_human"),
            connected_clients: parse_info_field(&info, "connected_clients").and_then(|s| s.parse().ok()),
            total_keys: parse_info_field(&info, "db0").and_then(|s| {
                s.split(',').next().and_then(|kv| kv.split('=').nth(1)).and_then(|n| n.parse().ok())
            }),
            hit_rate: None,
        })
    }
}

fn parse_info_field(info: &str, field: &str) -> Option<String> {
    info.lines()
        .find(|line| line.starts_with(&format!("{field}:")))
        .map(|line| line.splitn(2, ':').nth(1).unwrap_or("").trim().to_string())
}

/// Per-engine cache key: `search:{engine}:{sha1(query)}`. Each engine
/// caches independently, a request for `["musicbrainz", "jamendo"]` reads
/// and writes two separate keys rather than one combined one, so a cache
/// hit on one engine doesn't require the others to have been queried
/// together before.
pub fn build_cache_key(engine: &str, query: &str) -> String {
    use sha1::Digest;
    let mut digest = sha1::Sha1::default();
    digest.update(query.as_bytes());
    format!("search:{engine}:{:x}", digest.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_differs_by_engine() {
        let a = build_cache_key("youtube", "daft punk");
        let b = build_cache_key("musicbrainz", "daft punk");
        assert_ne!(a, b);
    }

    #[test]
    fn cache_key_differs_by_query() {
        let a = build_cache_key("musicbrainz", "daft punk");
        let b = build_cache_key("musicbrainz", "justice");
        assert_ne!(a, b);
    }

    #[test]
    fn cache_key_is_stable_for_same_input() {
        let a = build_cache_key("musicbrainz", "daft punk");
        let b = build_cache_key("musicbrainz", "daft punk");
        assert_eq!(a, b);
    }
}
