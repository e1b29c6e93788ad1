//! Rate limiter (C5), grounded on
//! `examples/original_source/music/rate_limiter/limiter.py`: a Redis
//! sorted-set sliding window per (engine, window) key, score = request
//! timestamp. `zremrangebyscore` trims expired entries, `zcard` checks
//! the remaining count against the limit, and an accepted request is
//! recorded with `zadd` + a TTL slightly longer than the window. Any
//! store error fails open, the original logs and returns `True` rather
//! than denying a request because Redis is unreachable.

use crate::config::RateLimitConfig;
use crate::error::AppError;
use deadpool_redis::{redis::AsyncCommands, Pool};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct RateLimiter {
    pool: Pool,
}

#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    pub remaining: u32,
    pub limit: u32,
    pub reset_at: u64,
}

impl RateLimiter {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    fn key(identifier: &str) -> String {
        format!("ratelimit:{identifier}")
    }

    fn now_seconds() -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
    }

    /// Atomically trims the window, checks the count, and, if under the
    /// limit, records this request. Returns `true` if the request may
    /// proceed. On a store error, fails open: the adapter it guards still
    /// runs, logged as a warning rather than surfaced as a denial.
    pub async fn try_acquire(&self, identifier: &str, config: &RateLimitConfig) -> bool {
        match self.try_acquire_inner(identifier, config).await {
            Ok(allowed) => allowed,
            Err(err) => {
                tracing::warn!(identifier, error = %err, "rate limiter store unavailable, failing open");
                true
            }
        }
    }

    async fn try_acquire_inner(&self, identifier: &str, config: &RateLimitConfig) -> Result<bool, AppError> {
        let mut conn = self.pool.get().await.map_err(|e| AppError::StoreUnavailable {
            store: format!("redis pool: {e}"),
        })?;
        let key = Self::key(identifier);
        let now = Self::now_seconds();
        let window_start = now.saturating_sub(config.window_seconds);

        let _: () = conn.zrembyscore(&key, 0, window_start as f64).await?;
        let current_count: u32 = conn.zcard(&key).await?;

        if current_count >= config.requests_per_window {
            return Ok(false);
        }

        let _: () = conn.zadd(&key, now, now as f64).await?;
        let _: () = conn.expire(&key, (config.window_seconds + 1) as i64).await?;
        Ok(true)
    }

    pub async fn status(&self, identifier: &str, config: &RateLimitConfig) -> RateLimitStatus {
        let remaining = self.remaining(identifier, config).await.unwrap_or(config.requests_per_window);
        RateLimitStatus {
            remaining,
            limit: config.requests_per_window,
            reset_at: Self::now_seconds() + config.window_seconds,
        }
    }

    async fn remaining(&self, identifier: &str, config: &RateLimitConfig) -> Result<u32, AppError> {
        let mut conn = self.pool.get().await.map_err(|e| AppError::StoreUnavailable {
            store: format!("redis pool: {e}"),
        })?;
        let key = Self::key(identifier);
        let now = Self::now_seconds();
        let window_start = now.saturating_sub(config.window_seconds);
        let _: () = conn.zrembyscore(&key, 0, window_start as f64).await?;
        let current_count: u32 = conn.zcard(&key).await?;
        Ok(config.requests_per_window.saturating_sub(current_count))
    }

    pub async fn reset(&self, identifier: &str) -> Result<(), AppError> {
        let mut conn = self.pool.get().await.map_err(|e| AppError::StoreUnavailable {
            store: format!("redis pool: {e}"),
        })?;
        let _: () = conn.del(Self::key(identifier)).await?;
        Ok(())
    }
}

/// Exponential backoff with jitter for adapter retry, grounded on the
/// backend's `RateLimitingService::exponential_backoff`. Capped so a
/// retry never pushes an adapter meaningfully past its soft timeout.
pub fn backoff_delay_ms(attempt: u32, base_delay_ms: u64, cap_ms: u64) -> u64 {
    let exp = base_delay_ms.saturating_mul(1u64 << attempt.min(10));
    let jitter = rand::random::<u64>() % 1000;
    (exp + jitter).min(cap_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_with_attempt_and_respects_cap() {
        let first = backoff_delay_ms(0, 100, 300_000);
        let later = backoff_delay_ms(5, 100, 300_000);
        assert!(later >= first);
        assert!(backoff_delay_ms(20, 100, 300_000) <= 300_000);
    }
}
