//! End-to-end scenarios S1-S6, exercising the pipeline the way a real
//! search request would rather than unit-testing each stage in
//! isolation. S1 (cache hit) and S4 (rate-limit denial) need a reachable
//! Redis and skip gracefully when `REDIS_URL` points at nothing, matching
//! the backend's own `rate_limiting_tests.rs` convention.

mod common;

use async_trait::async_trait;
use music_federate_core::circuit_breaker::CircuitBreakerRegistry;
use music_federate_core::classifier::{self, default_allowed_types};
use music_federate_core::config::{AppConfig, CacheConfig, CircuitBreakerConfig, DispatcherConfig, EngineConfig, RateLimitConfig, RedisSettings};
use music_federate_core::dedup_rank::dedupe_and_rank;
use music_federate_core::dispatcher::Dispatcher;
use music_federate_core::engines::standardize::standardize;
use music_federate_core::error::AppError;
use music_federate_core::models::{EngineDescriptor, RawResult};
use music_federate_core::rate_limiter::RateLimiter;
use music_federate_core::registry::Registry;
use music_federate_core::validation::validate_search_input;
use music_federate_core::cache::MusicCache;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn raw(engine: &str, title: &str, artist: &str, duration: &str) -> RawResult {
    RawResult {
        engine: engine.to_string(),
        url: format!("https://{engine}.example/track"),
        title: title.to_string(),
        artist: Some(artist.to_string()),
        duration: Some(duration.to_string()),
        ..Default::default()
    }
}

/// S2: classifier drop, a lyrics-only engine's result never reaches the
/// default-allowed output set even though it's a perfectly well-formed
/// normalized result.
#[test]
fn s2_classifier_drops_lyrics_by_default() {
    let genius_result = standardize(raw("genius", "Around the World", "Daft Punk", "3:45"), "Genius");
    let music_result = standardize(raw("musicbrainz", "Around the World", "Daft Punk", "3:45"), "MusicBrainz");

    let filtered = classifier::filter_results(vec![genius_result, music_result], &default_allowed_types());

    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].engine, "musicbrainz");
}

/// S5: cross-source unification, the same track surfaced by two
/// different engines collapses into a single unified track carrying both
/// platform presences.
#[test]
fn s5_cross_source_results_unify() {
    let youtube_result = standardize(raw("youtube-music", "Around the World", "Daft Punk", "3:45"), "YouTube Music");
    let soundcloud_result = standardize(
        raw("soundcloud", "Around the World", "Daft Punk feat. nobody", "3:45"),
        "SoundCloud",
    );

    let filtered = classifier::filter_results(
        vec![youtube_result, soundcloud_result],
        &default_allowed_types(),
    );
    let tracks = dedupe_and_rank(filtered);

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].platforms.len(), 2);
    assert!(tracks[0].platforms.contains_key("youtube-music"));
    assert!(tracks[0].platforms.contains_key("soundcloud"));
}

/// S6: invalid input rejection, a request with a dangerous query never
/// reaches the dispatcher's fan-out.
#[test]
fn s6_invalid_input_is_rejected_before_dispatch() {
    let known = vec!["musicbrainz".to_string()];
    let result = validate_search_input("<script>alert(1)</script>", &[], &known);
    assert!(result.is_err());
}

/// S6 variant: an unknown engine name is also rejected at Phase A, before
/// any adapter is touched.
#[test]
fn s6_unknown_engine_is_rejected() {
    let known = vec!["musicbrainz".to_string()];
    let result = validate_search_input("daft punk", &["not-a-real-engine".to_string()], &known);
    assert!(result.is_err());
}

/// Counts invocations so S1/S4 can assert the adapter was (or wasn't)
/// actually called, not just that the dispatch returned something.
struct CountingEngine {
    descriptor: EngineDescriptor,
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl music_federate_core::engines::MusicEngine for CountingEngine {
    fn descriptor(&self) -> &EngineDescriptor {
        &self.descriptor
    }

    async fn search(&self, _client: &reqwest::Client, _query: &str) -> Result<Vec<RawResult>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![RawResult {
            engine: self.descriptor.id.clone(),
            url: "https://jamendo.example/around-the-world".to_string(),
            title: "Around the World".to_string(),
            artist: Some("Daft Punk".to_string()),
            duration: Some("3:45".to_string()),
            ..Default::default()
        }])
    }
}

fn test_dispatcher(pool: deadpool_redis::Pool, calls: Arc<AtomicU32>) -> Dispatcher {
    let descriptor = EngineDescriptor::new("jamendo", "Jamendo", "jam", false, vec![]);
    let mut adapters: HashMap<String, Arc<dyn music_federate_core::engines::MusicEngine>> = HashMap::new();
    adapters.insert(
        "jamendo".to_string(),
        Arc::new(CountingEngine {
            descriptor,
            calls,
        }),
    );
    let mut configs = HashMap::new();
    configs.insert(
        "jamendo".to_string(),
        EngineConfig {
            enabled: true,
            api_key: None,
            rate_limit: RateLimitConfig {
                requests_per_window: 1000,
                window_seconds: 60,
            },
            circuit_breaker: CircuitBreakerConfig::default(),
        },
    );
    let registry = Arc::new(Registry::new(adapters, configs));
    let rate_limiter = Arc::new(RateLimiter::new(pool.clone()));
    let circuit_breakers = CircuitBreakerRegistry::new();
    let cache = Arc::new(MusicCache::new(
        pool,
        CacheConfig {
            enabled: true,
            key_prefix: "test_music_federate_scenarios".to_string(),
            compression: true,
            default_ttl: Duration::from_secs(60),
        },
    ));
    let config = AppConfig {
        environment: music_federate_core::config::Environment::Development,
        dispatcher: DispatcherConfig {
            overall_deadline: Duration::from_secs(5),
            per_engine_soft_timeout: Duration::from_secs(2),
            max_adapter_retries: 0,
            retry_base_delay_ms: 10,
            retry_cap_ms: 100,
        },
        cache: CacheConfig {
            enabled: true,
            key_prefix: "test_music_federate_scenarios".to_string(),
            compression: true,
            default_ttl: Duration::from_secs(60),
        },
        redis: RedisSettings {
            url: "redis://127.0.0.1:6379".to_string(),
            pool_size: 4,
        },
        engines: HashMap::new(),
    };
    Dispatcher::new(registry, rate_limiter, circuit_breakers, cache, config)
}

/// S1: cache hit, the second identical search against the same engine
/// never calls the adapter again and reports `cache_hit` in
/// `per_engine_status`. Skips if Redis isn't reachable.
#[tokio::test]
async fn s1_second_identical_search_reports_cache_hit_without_calling_adapter() {
    let Some(pool) = common::test_redis_pool().await else {
        eprintln!("skipping s1_second_identical_search_reports_cache_hit_without_calling_adapter - Redis not available");
        return;
    };
    let calls = Arc::new(AtomicU32::new(0));
    let dispatcher = test_dispatcher(pool, calls.clone());
    let engines = vec!["jamendo".to_string()];

    let first = dispatcher.dispatch("daft punk around the world", &engines).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        first.engine_status.get("jamendo"),
        Some(&music_federate_core::registry::EngineStatus::Completed)
    );

    let second = dispatcher.dispatch("daft punk around the world", &engines).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1, "adapter must not be called again on a cache hit");
    assert_eq!(
        second.engine_status.get("jamendo"),
        Some(&music_federate_core::registry::EngineStatus::CacheHit)
    );
    assert_eq!(second.results.len(), first.results.len());
}

/// S4: rate-limit denial, once the window's request budget is
/// exhausted, further acquisitions are denied until the window rolls
/// over, and a denial never writes to the cache. Skips if Redis isn't
/// reachable.
#[tokio::test]
async fn s4_rate_limit_denies_once_budget_exhausted() {
    let Some(pool) = common::test_redis_pool().await else {
        eprintln!("skipping s4_rate_limit_denies_once_budget_exhausted - Redis not available");
        return;
    };
    let limiter = RateLimiter::new(pool);
    let config = RateLimitConfig {
        requests_per_window: 2,
        window_seconds: 60,
    };
    let identifier = format!("test-engine-{}", uuid::Uuid::new_v4());

    assert!(limiter.try_acquire(&identifier, &config).await);
    assert!(limiter.try_acquire(&identifier, &config).await);
    assert!(!limiter.try_acquire(&identifier, &config).await);

    limiter.reset(&identifier).await.ok();
}
