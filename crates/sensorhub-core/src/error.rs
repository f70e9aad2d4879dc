// ── Core error types ──
//
// User-facing errors from sensorhub-core. Consumers never see reqwest or
// serde failures directly: the `From<sensorhub_api::Error>` impl folds
// transport-layer errors into domain variants.

use thiserror::Error;

use crate::routes::RouteError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the SensorHub API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── Auth errors ──────────────────────────────────────────────────
    #[error("Not signed in or session expired")]
    Unauthorized,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Routing errors ───────────────────────────────────────────────
    #[error("No route matches '{path}'")]
    RouteNotFound { path: String },

    #[error(transparent)]
    Route(#[from] RouteError),

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Storage / configuration ──────────────────────────────────────
    #[error("Credential storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<sensorhub_api::Error> for CoreError {
    fn from(err: sensorhub_api::Error) -> Self {
        use sensorhub_api::Error as ApiError;

        match err {
            ApiError::Unauthorized { .. } => CoreError::Unauthorized,
            ApiError::Forbidden { .. } => CoreError::PermissionDenied,
            ApiError::Validation { message, .. } => CoreError::ValidationFailed { message },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Api {
                status, message, ..
            } => CoreError::Api {
                message,
                status: Some(status),
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            ApiError::Storage(message) => CoreError::Storage { message },
        }
    }
}
