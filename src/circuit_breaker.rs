//! Per-engine circuit breaker, generalizing the store-level fail-open
//! policy to adapter-level failures. Grounded on the backend's
//! `circuit_breaker.rs` state machine (closed → open after N consecutive
//! failures in a window → half-open test → closed), with the
//! prometheus-metrics plumbing dropped in favor of plain `tracing`
//! events, this crate has no metrics-scraping HTTP surface to serve
//! them from.

use crate::config::CircuitBreakerConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        };
        write!(f, "{label}")
    }
}

struct EngineCircuit {
    state: CircuitState,
    failure_timestamps: Vec<Instant>,
    opened_at: Option<Instant>,
    half_open_successes: u32,
}

impl Default for EngineCircuit {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_timestamps: Vec::new(),
            opened_at: None,
            half_open_successes: 0,
        }
    }
}

/// Tracks one circuit per engine id. Shared across dispatcher workers via
/// `Arc<RwLock<HashMap<...>>>`, matching the backend's pattern for
/// per-key runtime state that many tasks read and occasionally mutate.
#[derive(Clone)]
pub struct CircuitBreakerRegistry {
    circuits: Arc<RwLock<HashMap<String, EngineCircuit>>>,
}

impl CircuitBreakerRegistry {
    pub fn new() -> Self {
        Self {
            circuits: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Whether a request to this engine should even be attempted. An
    /// `Open` circuit past its timeout transitions to `HalfOpen` and
    /// allows exactly one test request through.
    pub async fn allow_request(&self, engine: &str, config: &CircuitBreakerConfig) -> bool {
        let mut circuits = self.circuits.write().await;
        let circuit = circuits.entry(engine.to_string()).or_default();
        match circuit.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let timed_out = circuit
                    .opened_at
                    .map(|t| t.elapsed().as_secs() >= config.open_timeout_seconds)
                    .unwrap_or(true);
                if timed_out {
                    circuit.state = CircuitState::HalfOpen;
                    circuit.half_open_successes = 0;
                    tracing::info!(engine, "circuit breaker half-opening for test request");
                    true
                } else {
                    false
                }
            }
        }
    }

    pub async fn record_success(&self, engine: &str, config: &CircuitBreakerConfig) {
        let mut circuits = self.circuits.write().await;
        let circuit = circuits.entry(engine.to_string()).or_default();
        match circuit.state {
            CircuitState::HalfOpen => {
                circuit.half_open_successes += 1;
                if circuit.half_open_successes >= config.half_open_success_threshold {
                    circuit.state = CircuitState::Closed;
                    circuit.failure_timestamps.clear();
                    circuit.opened_at = None;
                    tracing::info!(engine, "circuit breaker closed after successful half-open test");
                }
            }
            CircuitState::Closed => {
                circuit.failure_timestamps.clear();
            }
            CircuitState::Open => {}
        }
    }

    pub async fn record_failure(&self, engine: &str, config: &CircuitBreakerConfig) {
        let mut circuits = self.circuits.write().await;
        let circuit = circuits.entry(engine.to_string()).or_default();
        match circuit.state {
            CircuitState::HalfOpen => {
                circuit.state = CircuitState::Open;
                circuit.opened_at = Some(Instant::now());
                tracing::warn!(engine, "circuit breaker reopened after half-open test failure");
            }
            CircuitState::Closed => {
                let now = Instant::now();
                circuit.failure_timestamps.push(now);
                let window_secs = config.failure_window_seconds;
                circuit
                    .failure_timestamps
                    .retain(|t| now.duration_since(*t).as_secs() <= window_secs);
                if circuit.failure_timestamps.len() as u32 >= config.failure_threshold {
                    circuit.state = CircuitState::Open;
                    circuit.opened_at = Some(now);
                    tracing::warn!(engine, "circuit breaker opened after repeated failures");
                }
            }
            CircuitState::Open => {}
        }
    }

    pub async fn state(&self, engine: &str) -> CircuitState {
        let circuits = self.circuits.read().await;
        circuits.get(engine).map(|c| c.state).unwrap_or(CircuitState::Closed)
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 3,
            failure_window_seconds: 60,
            open_timeout_seconds: 30,
            half_open_success_threshold: 1,
        }
    }

    #[tokio::test]
    async fn opens_after_threshold_failures() {
        let registry = CircuitBreakerRegistry::new();
        let config = config();
        for _ in 0..3 {
            registry.record_failure("engine-a", &config).await;
        }
        assert_eq!(registry.state("engine-a").await, CircuitState::Open);
        assert!(!registry.allow_request("engine-a", &config).await);
    }

    #[tokio::test]
    async fn stays_closed_on_intermittent_success() {
        let registry = CircuitBreakerRegistry::new();
        let config = config();
        registry.record_failure("engine-b", &config).await;
        registry.record_success("engine-b", &config).await;
        registry.record_failure("engine-b", &config).await;
        assert_eq!(registry.state("engine-b").await, CircuitState::Closed);
    }
}
