//! Dispatcher (C8): the concurrency core. One tokio task per queried
//! engine, an overall deadline and a per-engine soft timeout, and a
//! partial-success guarantee, a single engine failing, timing out, or
//! being rate-limited never fails the whole request. Grounded on the
//! backend's `services/job_queue.rs` fan-out/gather idiom
//! (`tokio::spawn` per unit of work, `tokio::time::timeout` per task,
//! `tokio::select!` against a deadline).

use crate::cache::{build_cache_key, MusicCache};
use crate::circuit_breaker::CircuitBreakerRegistry;
use crate::classifier;
use crate::config::{AppConfig, RateLimitConfig};
use crate::engines::standardize::standardize;
use crate::error::AppError;
use crate::models::{ContentType, NormalizedResult, RawResult};
use crate::rate_limiter::RateLimiter;
use crate::registry::{EngineStatus, Registry};
use crate::validation;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct Dispatcher {
    registry: Arc<Registry>,
    rate_limiter: Arc<RateLimiter>,
    circuit_breakers: CircuitBreakerRegistry,
    cache: Arc<MusicCache>,
    config: AppConfig,
    http_client: reqwest::Client,
}

/// What a single engine's run produced, distinguishing a cache hit from a
/// freshly-fetched result set so `dispatch` can report the right
/// `EngineStatus` without re-deriving it from the result content.
enum EngineOutcome {
    CacheHit(Vec<NormalizedResult>),
    Fresh(Vec<NormalizedResult>),
}

pub struct DispatchOutcome {
    pub results: Vec<NormalizedResult>,
    pub engine_status: HashMap<String, EngineStatus>,
    pub elapsed: Duration,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<Registry>,
        rate_limiter: Arc<RateLimiter>,
        circuit_breakers: CircuitBreakerRegistry,
        cache: Arc<MusicCache>,
        config: AppConfig,
    ) -> Self {
        Self {
            registry,
            rate_limiter,
            circuit_breakers,
            cache,
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Runs `query` against `requested_engines` (or every enabled engine
    /// if empty), fanning out one task per engine, honoring the overall
    /// deadline and per-engine soft timeout, and always returning
    /// whatever completed in time: the partial-success guarantee.
    pub async fn dispatch(&self, query: &str, requested_engines: &[String]) -> Result<DispatchOutcome, AppError> {
        let known = self.registry.known_engine_ids();
        validation::validate_search_input(query, requested_engines, &known)?;

        let target_engines: Vec<String> = if requested_engines.is_empty() {
            known.into_iter().filter(|id| self.registry.is_enabled(id)).collect()
        } else {
            requested_engines.to_vec()
        };

        let started = Instant::now();
        let mut handles = Vec::with_capacity(target_engines.len());
        let allowed_types = classifier::default_allowed_types();

        for engine_id in &target_engines {
            let engine_id = engine_id.clone();
            if !self.registry.is_enabled(&engine_id) {
                handles.push(tokio::spawn(async move {
                    (engine_id, Err(AppError::EngineDisabled { engine: String::new() }))
                }));
                continue;
            }
            let adapter = self.registry.adapter(&engine_id);
            let Some(adapter) = adapter else {
                continue;
            };
            let rate_config = self
                .registry
                .config(&engine_id)
                .map(|c| c.rate_limit.clone())
                .unwrap_or_default();
            let circuit_config = self
                .registry
                .config(&engine_id)
                .map(|c| c.circuit_breaker.clone())
                .unwrap_or_default();
            let rate_limiter = self.rate_limiter.clone();
            let circuit_breakers = self.circuit_breakers.clone();
            let client = self.http_client.clone();
            let cache = self.cache.clone();
            let cache_config = self.config.cache.clone();
            let soft_timeout = self.config.dispatcher.per_engine_soft_timeout;
            let retry_config = RetryConfig {
                max_retries: self.config.dispatcher.max_adapter_retries,
                base_delay_ms: self.config.dispatcher.retry_base_delay_ms,
                cap_ms: self.config.dispatcher.retry_cap_ms,
            };
            let query = query.to_string();
            let allowed = allowed_types.clone();

            handles.push(tokio::spawn(async move {
                let outcome = run_one_engine(
                    engine_id.clone(),
                    adapter,
                    client,
                    query,
                    rate_limiter,
                    rate_config,
                    circuit_breakers,
                    circuit_config,
                    cache,
                    cache_config,
                    allowed,
                    retry_config,
                    soft_timeout,
                )
                .await;
                (engine_id, outcome)
            }));
        }

        let mut status = HashMap::new();
        let mut results = Vec::new();

        // Accumulate into `status`/`results` as each task finishes, not
        // after all of them do, so a timeout below still keeps whatever
        // completed before the cutoff instead of discarding it.
        let gather = async {
            for handle in handles {
                match handle.await {
                    Ok((engine_id, Ok(EngineOutcome::CacheHit(engine_results)))) => {
                        status.insert(engine_id, EngineStatus::CacheHit);
                        results.extend(engine_results);
                    }
                    Ok((engine_id, Ok(EngineOutcome::Fresh(engine_results)))) => {
                        status.insert(engine_id, EngineStatus::Completed);
                        results.extend(engine_results);
                    }
                    Ok((engine_id, Err(err))) => {
                        status.insert(engine_id.clone(), status_for_error(&err));
                    }
                    Err(_join_error) => {}
                }
            }
        };

        let overall_deadline = self.config.dispatcher.overall_deadline;
        if tokio::time::timeout(overall_deadline, gather).await.is_err() {
            tracing::warn!(elapsed_ms = started.elapsed().as_millis() as u64, "overall deadline hit, returning partial results");
        }

        let elapsed = started.elapsed();
        tracing::info!(
            total_queried = target_engines.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            completed = status.values().filter(|s| matches!(s, EngineStatus::Completed | EngineStatus::CacheHit)).count(),
            "dispatch finished"
        );

        Ok(DispatchOutcome {
            results,
            engine_status: status,
            elapsed,
        })
    }
}

/// One engine's full turn: cache read, rate limit, fetch (with retry on a
/// transient adapter failure), standardize/sanitize/classify, cache
/// write. A cache hit skips straight past fetch/standardize to returning
/// the cached, already-classified results.
#[allow(clippy::too_many_arguments)]
async fn run_one_engine(
    engine_id: String,
    adapter: Arc<dyn crate::engines::MusicEngine>,
    client: reqwest::Client,
    query: String,
    rate_limiter: Arc<RateLimiter>,
    rate_config: RateLimitConfig,
    circuit_breakers: CircuitBreakerRegistry,
    circuit_config: crate::config::CircuitBreakerConfig,
    cache: Arc<MusicCache>,
    cache_config: crate::config::CacheConfig,
    allowed_types: Vec<ContentType>,
    retry_config: RetryConfig,
    soft_timeout: Duration,
) -> Result<EngineOutcome, AppError> {
    let cache_key = build_cache_key(&engine_id, &query);

    if cache_config.enabled {
        if let Ok(Some(cached)) = cache.get(&cache_key).await {
            return Ok(EngineOutcome::CacheHit(cached));
        }
    }

    if !circuit_breakers.allow_request(&engine_id, &circuit_config).await {
        return Err(AppError::AdapterFatal {
            engine: engine_id,
            message: "circuit open, skipping".to_string(),
        });
    }

    if !rate_limiter.try_acquire(&engine_id, &rate_config).await {
        return Err(AppError::RateLimited {
            engine: engine_id,
            retry_after_seconds: Some(rate_config.window_seconds),
        });
    }

    let deadline = tokio::time::Instant::now() + soft_timeout;
    let fetch_future = async {
        let mut attempt = 0;
        loop {
            match adapter.search(&client, &query).await {
                Ok(raw) => break Ok(raw),
                Err(err) if attempt < retry_config.max_retries && is_retryable(&err) => {
                    let delay = crate::rate_limiter::backoff_delay_ms(
                        attempt,
                        retry_config.base_delay_ms,
                        retry_config.cap_ms,
                    );
                    tracing::warn!(engine = %engine_id, attempt, error = %err, "retrying after transient adapter failure");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(err) => break Err(err),
            }
        }
    };

    let raw_outcome = match tokio::time::timeout_at(deadline, fetch_future).await {
        Ok(result) => result,
        Err(_elapsed) => Err(AppError::Timeout {
            scope: engine_id.clone(),
        }),
    };

    match &raw_outcome {
        Ok(_) => circuit_breakers.record_success(&engine_id, &circuit_config).await,
        Err(AppError::Timeout { .. }) | Err(AppError::AdapterFatal { .. }) | Err(AppError::AdapterParseError { .. }) => {
            circuit_breakers.record_failure(&engine_id, &circuit_config).await
        }
        Err(_) => {}
    }

    let raw = raw_outcome?;
    let sanitized: Vec<RawResult> = raw.into_iter().map(validation::sanitize_raw_result).collect();
    let engine_name = adapter.descriptor().name.clone();
    let normalized: Vec<NormalizedResult> = sanitized
        .into_iter()
        .map(|result| standardize(result, &engine_name))
        .collect();
    let classified = classifier::filter_results(normalized, &allowed_types);

    if cache_config.enabled {
        if let Err(err) = cache.set_ex(&cache_key, cache_config.default_ttl.as_secs(), &classified).await {
            tracing::warn!(engine = %engine_id, error = %err, "cache write failed, continuing uncached");
        }
    }

    Ok(EngineOutcome::Fresh(classified))
}

/// Only a transport-level failure is worth retrying. `Timeout` and
/// `RateLimited` already have their own defined semantics upstream,
/// retrying them here would just double up on those.
fn is_retryable(err: &AppError) -> bool {
    matches!(err, AppError::AdapterFatal { .. } | AppError::AdapterParseError { .. })
}

#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub cap_ms: u64,
}

fn status_for_error(err: &AppError) -> EngineStatus {
    match err {
        AppError::EngineDisabled { .. } => EngineStatus::Disabled,
        AppError::RateLimited { .. } => EngineStatus::RateLimited,
        AppError::Timeout { .. } => EngineStatus::Timeout,
        _ => EngineStatus::Failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EngineDescriptor;
    use async_trait::async_trait;

    struct SlowEngine {
        descriptor: EngineDescriptor,
        delay: Duration,
    }

    #[async_trait]
    impl crate::engines::MusicEngine for SlowEngine {
        fn descriptor(&self) -> &EngineDescriptor {
            &self.descriptor
        }

        async fn search(&self, _client: &reqwest::Client, _query: &str) -> Result<Vec<RawResult>, AppError> {
            tokio::time::sleep(self.delay).await;
            Ok(vec![RawResult {
                engine: self.descriptor.id.clone(),
                url: "https://example.com/1".to_string(),
                title: "Slow Result".to_string(),
                ..Default::default()
            }])
        }
    }

    /// S3: an adapter slower than its soft timeout yields a `Timeout`
    /// status rather than hanging the whole dispatch, the per-engine
    /// `tokio::time::timeout` wrapping in `run_one_engine` is what makes
    /// this a partial failure instead of a propagated error.
    #[tokio::test]
    async fn timeout_surfaces_as_timeout_status_not_a_hang() {
        let adapter: Arc<dyn crate::engines::MusicEngine> = Arc::new(SlowEngine {
            descriptor: EngineDescriptor::new("slow", "Slow Engine", "slw", false, vec![]),
            delay: Duration::from_millis(200),
        });
        let pool = deadpool_redis::Config::from_url("redis://127.0.0.1:1")
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .unwrap();
        let rate_limiter = Arc::new(RateLimiter::new(pool.clone()));
        let circuit_breakers = CircuitBreakerRegistry::new();
        let cache = Arc::new(crate::cache::MusicCache::new(
            pool,
            crate::config::CacheConfig {
                enabled: false,
                key_prefix: "test".to_string(),
                compression: false,
                default_ttl: Duration::from_secs(60),
            },
        ));

        let result = run_one_engine(
            "slow".to_string(),
            adapter,
            reqwest::Client::new(),
            "test query".to_string(),
            rate_limiter,
            RateLimitConfig::default(),
            circuit_breakers,
            crate::config::CircuitBreakerConfig::default(),
            cache,
            crate::config::CacheConfig {
                enabled: false,
                key_prefix: "test".to_string(),
                compression: false,
                default_ttl: Duration::from_secs(60),
            },
            classifier::default_allowed_types(),
            RetryConfig {
                max_retries: 0,
                base_delay_ms: 10,
                cap_ms: 100,
            },
            Duration::from_millis(50),
        )
        .await;

        assert!(matches!(result, Err(AppError::Timeout { .. })));
    }

    #[test]
    fn status_for_error_maps_every_partial_failure_kind() {
        assert_eq!(
            status_for_error(&AppError::EngineDisabled { engine: String::new() }),
            EngineStatus::Disabled
        );
        assert_eq!(
            status_for_error(&AppError::Timeout { scope: String::new() }),
            EngineStatus::Timeout
        );
        assert_eq!(
            status_for_error(&AppError::AdapterFatal {
                engine: String::new(),
                message: String::new()
            }),
            EngineStatus::Failed
        );
    }
}
