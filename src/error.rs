//! Error taxonomy for the federated search core.
//!
//! Mirrors the error taxonomy from the component design: each variant
//! carries what a caller needs, `status_code()`/`error_code()`/
//! `user_message()` give a stable surface for whatever sits in front of
//! this core, and `From` impls for the stores we actually touch (redis,
//! serde_json) keep call sites using plain `?`.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable, serializable error payload. Whatever exposes this core over
/// HTTP can serialize this unchanged.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub correlation_id: String,
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid search input: {message}")]
    InvalidInput { message: String },

    #[error("engine disabled: {engine}")]
    EngineDisabled { engine: String },

    #[error("rate limited: {engine}")]
    RateLimited {
        engine: String,
        retry_after_seconds: Option<u64>,
    },

    #[error("timed out: {scope}")]
    Timeout { scope: String },

    #[error("adapter parse error in {engine}: {message}")]
    AdapterParseError { engine: String, message: String },

    #[error("adapter {engine} failed before producing any result: {message}")]
    AdapterFatal { engine: String, message: String },

    #[error("external store unavailable: {store}")]
    StoreUnavailable { store: String },

    #[error("validation failed for storage")]
    ValidationError { errors: Vec<String> },

    #[error("configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("internal error")]
    Internal { message: Option<String> },
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput { .. } | AppError::ValidationError { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::EngineDisabled { .. } => StatusCode::NOT_FOUND,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AppError::AdapterParseError { .. } | AppError::AdapterFatal { .. } => {
                StatusCode::BAD_GATEWAY
            }
            AppError::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ConfigurationError { .. } | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput { .. } => "INVALID_INPUT",
            AppError::EngineDisabled { .. } => "ENGINE_DISABLED",
            AppError::RateLimited { .. } => "RATE_LIMITED",
            AppError::Timeout { .. } => "TIMEOUT",
            AppError::AdapterParseError { .. } => "ADAPTER_PARSE_ERROR",
            AppError::AdapterFatal { .. } => "ADAPTER_FATAL",
            AppError::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
            AppError::ValidationError { .. } => "VALIDATION_ERROR",
            AppError::ConfigurationError { .. } => "CONFIGURATION_ERROR",
            AppError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidInput { message } => message.clone(),
            AppError::EngineDisabled { engine } => format!("{engine} is not enabled"),
            AppError::RateLimited { engine, .. } => format!("{engine} is rate limited"),
            AppError::Timeout { scope } => format!("{scope} timed out"),
            AppError::AdapterParseError { engine, .. } => {
                format!("{engine} returned unparseable data")
            }
            AppError::AdapterFatal { engine, .. } => format!("{engine} is unavailable"),
            AppError::StoreUnavailable { store } => format!("{store} is unavailable"),
            AppError::ValidationError { .. } => "one or more fields failed validation".to_string(),
            AppError::ConfigurationError { message } => message.clone(),
            AppError::Internal { .. } => "an unexpected error occurred".to_string(),
        }
    }

    pub fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::RateLimited {
                retry_after_seconds,
                ..
            } => Some(serde_json::json!({ "retry_after_seconds": retry_after_seconds })),
            AppError::ValidationError { errors } => Some(serde_json::json!({ "errors": errors })),
            _ => None,
        }
    }

    /// True for errors the dispatcher should treat as a single-engine
    /// failure rather than surfacing to the caller (every variant except
    /// `InvalidInput`, which is the only caller-visible whole-request
    /// failure).
    pub fn is_partial_failure(&self) -> bool {
        !matches!(self, AppError::InvalidInput { .. })
    }

    pub fn to_response(&self) -> ErrorResponse {
        let correlation_id = Uuid::new_v4().to_string();
        match self {
            AppError::Internal { .. }
            | AppError::ConfigurationError { .. }
            | AppError::StoreUnavailable { .. } => {
                tracing::error!(
                    correlation_id = %correlation_id,
                    error_code = %self.error_code(),
                    error = %self,
                    "server error"
                );
            }
            AppError::AdapterParseError { .. } | AppError::AdapterFatal { .. } => {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    error_code = %self.error_code(),
                    error = %self,
                    "adapter error"
                );
            }
            _ => {
                tracing::info!(
                    correlation_id = %correlation_id,
                    error_code = %self.error_code(),
                    error = %self,
                    "client error"
                );
            }
        }

        ErrorResponse {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
            message: self.user_message(),
            details: self.error_details(),
            correlation_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        tracing::warn!(error = %err, "redis operation failed, treating as store-unavailable");
        AppError::StoreUnavailable {
            store: "redis".to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal {
            message: Some(format!("json error: {err}")),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal {
            message: Some(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_is_bad_request() {
        let err = AppError::InvalidInput {
            message: "query too short".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(!err.is_partial_failure());
    }

    #[test]
    fn rate_limited_is_partial_failure() {
        let err = AppError::RateLimited {
            engine: "spotify".to_string(),
            retry_after_seconds: Some(5),
        };
        assert!(err.is_partial_failure());
        let details = err.error_details().unwrap();
        assert_eq!(details["retry_after_seconds"], 5);
    }
}
