//! Application configuration module
//!
//! Provides centralized, environment-aware configuration with validation,
//! following the backend's `AppConfig`/`Environment` split: one struct per
//! concern, each with its own `from_env()`, composed into `AppConfig`.

use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(String),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("{0}")]
    Substitution(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        match env::var("ENVIRONMENT").unwrap_or_default().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Expands `${VAR}`, `${VAR:-default}` and `${VAR:?error}` forms in a raw
/// config string. A missing required variable (`:?`) or a bare `${VAR}`
/// with no default fails config load rather than being silently left
/// as-is, the point is to fail fast at startup, not mid-search.
pub fn substitute_env(raw: &str) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(raw.len());
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            let close = raw[i + 2..]
                .find('}')
                .map(|p| i + 2 + p)
                .ok_or_else(|| ConfigError::Substitution("unterminated ${...}".to_string()))?;
            let inner = &raw[i + 2..close];
            out.push_str(&resolve_placeholder(inner)?);
            i = close + 1;
        } else {
            out.push(bytes[i] as char);
            i += 1;
        }
    }
    Ok(out)
}

fn resolve_placeholder(inner: &str) -> Result<String, ConfigError> {
    if let Some((var, default)) = inner.split_once(":-") {
        return Ok(env::var(var).unwrap_or_else(|_| default.to_string()));
    }
    if let Some((var, error_message)) = inner.split_once(":?") {
        return env::var(var).map_err(|_| {
            ConfigError::MissingRequired(if error_message.is_empty() {
                var.to_string()
            } else {
                format!("{var}: {error_message}")
            })
        });
    }
    env::var(inner).map_err(|_| ConfigError::MissingRequired(inner.to_string()))
}

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub overall_deadline: Duration,
    pub per_engine_soft_timeout: Duration,
    /// Retries for a transient (non-timeout, non-rate-limit) adapter
    /// failure, backed off via `rate_limiter::backoff_delay_ms`.
    pub max_adapter_retries: u32,
    pub retry_base_delay_ms: u64,
    pub retry_cap_ms: u64,
}

impl DispatcherConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            overall_deadline: Duration::from_millis(env_u64("DISPATCHER_OVERALL_DEADLINE_MS", 15_000)?),
            per_engine_soft_timeout: Duration::from_millis(env_u64(
                "DISPATCHER_ENGINE_SOFT_TIMEOUT_MS",
                10_000,
            )?),
            max_adapter_retries: env_u64("DISPATCHER_MAX_ADAPTER_RETRIES", 2)? as u32,
            retry_base_delay_ms: env_u64("DISPATCHER_RETRY_BASE_DELAY_MS", 100)?,
            retry_cap_ms: env_u64("DISPATCHER_RETRY_CAP_MS", 2_000)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub key_prefix: String,
    pub compression: bool,
    pub default_ttl: Duration,
}

impl CacheConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: env_bool("MUSIC_CACHE_ENABLED", true)?,
            key_prefix: env::var("MUSIC_CACHE_KEY_PREFIX").unwrap_or_else(|_| "searxng_music".to_string()),
            compression: env_bool("MUSIC_CACHE_COMPRESSION", true)?,
            default_ttl: Duration::from_secs(env_u64("MUSIC_CACHE_TTL_SECONDS", 3600)?),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RedisSettings {
    pub url: String,
    pub pool_size: usize,
}

impl RedisSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            pool_size: env_u64("REDIS_POOL_SIZE", 10)? as usize,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_window: u32,
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: 60,
            window_seconds: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub failure_window_seconds: u64,
    pub open_timeout_seconds: u64,
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            failure_window_seconds: 60,
            open_timeout_seconds: 30,
            half_open_success_threshold: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub rate_limit: RateLimitConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl EngineConfig {
    /// Builds a per-engine config from `{PREFIX}_API_KEY`,
    /// `{PREFIX}_ENABLED`, `{PREFIX}_RATE_LIMIT`, `{PREFIX}_RATE_PERIOD`:
    /// a token-requiring engine with no key configured comes up disabled
    /// rather than failing the whole config load, matching the
    /// split between token and no-token adapters.
    pub fn from_env(engine_id: &str, requires_api_key: bool) -> Result<Self, ConfigError> {
        let prefix = engine_id.to_uppercase().replace('-', "_");
        let api_key = env::var(format!("{prefix}_API_KEY")).ok();
        let mut enabled = env_bool(&format!("{prefix}_ENABLED"), true)?;
        if requires_api_key && api_key.is_none() {
            enabled = false;
        }
        Ok(Self {
            enabled,
            api_key,
            rate_limit: RateLimitConfig {
                requests_per_window: env_u64(&format!("{prefix}_RATE_LIMIT"), 60)? as u32,
                window_seconds: env_u64(&format!("{prefix}_RATE_PERIOD"), 60)?,
            },
            circuit_breaker: CircuitBreakerConfig::default(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub dispatcher: DispatcherConfig,
    pub cache: CacheConfig,
    pub redis: RedisSettings,
    pub engines: HashMap<String, EngineConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let environment = Environment::from_env();
        let config = Self {
            environment,
            dispatcher: DispatcherConfig::from_env()?,
            cache: CacheConfig::from_env()?,
            redis: RedisSettings::from_env()?,
            engines: crate::engines::default_engine_configs()?,
        };
        if environment.is_production() {
            config.validate_production()?;
        }
        Ok(config)
    }

    fn validate_production(&self) -> Result<(), ConfigError> {
        if self.redis.url.contains("127.0.0.1") || self.redis.url.contains("localhost") {
            return Err(ConfigError::InvalidValue {
                key: "REDIS_URL".to_string(),
                message: "must not point at localhost in production".to_string(),
            });
        }
        Ok(())
    }
}

fn env_u64(key: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected an integer, got {v:?}"),
        }),
        Err(_) => Ok(default),
    }
}

fn env_bool(key: &str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(v) => match v.to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected a boolean, got {v:?}"),
            }),
        },
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_default_when_unset() {
        env::remove_var("MFC_TEST_UNSET_VAR");
        let resolved = substitute_env("prefix-${MFC_TEST_UNSET_VAR:-fallback}-suffix").unwrap();
        assert_eq!(resolved, "prefix-fallback-suffix");
    }

    #[test]
    fn substitutes_set_value_over_default() {
        env::set_var("MFC_TEST_SET_VAR", "actual");
        let resolved = substitute_env("${MFC_TEST_SET_VAR:-fallback}").unwrap();
        assert_eq!(resolved, "actual");
        env::remove_var("MFC_TEST_SET_VAR");
    }

    #[test]
    fn required_missing_var_fails() {
        env::remove_var("MFC_TEST_REQUIRED_VAR");
        let result = substitute_env("${MFC_TEST_REQUIRED_VAR:?must be set}");
        assert!(result.is_err());
    }
}
