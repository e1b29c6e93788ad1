use deadpool_redis::{Config, Runtime};
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_test_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("debug")
            .try_init()
            .ok();
    });
}

/// A Redis-backed pool for tests that exercise the cache/rate-limiter/
/// circuit breaker stores, matching the backend's `rate_limiting_tests.rs`
/// convention: read `REDIS_URL` (defaulting to localhost) and let callers
/// skip gracefully when nothing is listening there, rather than spinning
/// up a container per test run.
pub async fn test_redis_pool() -> Option<deadpool_redis::Pool> {
    init_test_tracing();
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let pool = Config::from_url(url).create_pool(Some(Runtime::Tokio1)).ok()?;
    match pool.get().await {
        Ok(_) => Some(pool),
        Err(_) => None,
    }
}
