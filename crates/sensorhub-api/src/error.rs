use thiserror::Error;

use crate::models::FieldErrors;

/// Top-level error type for the `sensorhub-api` crate.
///
/// Covers every failure mode of the HTTP client and the credential
/// storage backends. `sensorhub-core` classifies these into user-facing
/// outcomes (notifications, redirects) and never lets them reach the UI raw.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// HTTP 401: token missing, expired or revoked.
    #[error("Unauthorized -- session expired or token revoked")]
    Unauthorized { message: Option<String> },

    /// HTTP 403: authenticated but not allowed.
    #[error("Permission denied (HTTP 403)")]
    Forbidden { message: Option<String> },

    /// Field-level validation failure (`{ message, errors: { field: [..] } }`).
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        status: u16,
        errors: FieldErrors,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Any other non-success status, passed through for the caller.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        body: Option<serde_json::Value>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Storage ─────────────────────────────────────────────────────
    /// Persisted credential storage could not be read or written.
    #[error("Credential storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Returns `true` for HTTP 401.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns `true` for HTTP 403.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }

    /// Returns `true` if this is a transient error: the network failed or
    /// the server answered with a 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The HTTP status the server answered with, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::Validation { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The field-level error map of a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }
}
