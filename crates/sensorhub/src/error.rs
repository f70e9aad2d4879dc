//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use sensorhub_config::ConfigError;
use sensorhub_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the SensorHub API at {url}: {reason}")]
    #[diagnostic(
        code(sensorhub::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             Set the URL with --api-url, SENSORHUB_API_URL or `sensorhub config init`."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(sensorhub::timeout),
        help("Increase the timeout with --timeout or check the backend's responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(sensorhub::auth_failed),
        help("Check your email and password, then run: sensorhub login")
    )]
    AuthFailed { message: String },

    #[error("Not signed in or session expired")]
    #[diagnostic(code(sensorhub::not_signed_in), help("Run: sensorhub login"))]
    NotSignedIn,

    #[error("Permission denied")]
    #[diagnostic(
        code(sensorhub::permission_denied),
        help("This action requires an administrator account.")
    )]
    PermissionDenied,

    // ── Routing ──────────────────────────────────────────────────────
    #[error("No route matches '{path}'")]
    #[diagnostic(
        code(sensorhub::route_not_found),
        help("Run: sensorhub routes to see the navigable paths")
    )]
    RouteNotFound { path: String },

    #[error("Route table rejected: {reason}")]
    #[diagnostic(code(sensorhub::route_table))]
    RouteTable { reason: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(sensorhub::api_error))]
    Api { message: String, status: Option<u16> },

    // ── Validation / configuration ───────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(sensorhub::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(
        code(sensorhub::config),
        help("Inspect the resolved settings with: sensorhub config show")
    )]
    Config(ConfigError),

    #[error("Credential storage error: {message}")]
    #[diagnostic(code(sensorhub::storage))]
    Storage { message: String },

    #[error("Internal error: {0}")]
    #[diagnostic(code(sensorhub::internal))]
    Internal(String),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NotSignedIn => exit_code::AUTH,
            Self::PermissionDenied => exit_code::PERMISSION,
            Self::RouteNotFound { .. }
            | Self::Api {
                status: Some(404), ..
            } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::Config(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            // The core error carries no duration; the CLI reports the
            // configured one via `with_timeout`.
            CoreError::Timeout => Self::Timeout { seconds: 0 },
            CoreError::Unauthorized => Self::NotSignedIn,
            CoreError::PermissionDenied => Self::PermissionDenied,
            CoreError::ValidationFailed { message } => Self::Validation {
                field: "request".into(),
                reason: message,
            },
            CoreError::RouteNotFound { path } => Self::RouteNotFound { path },
            CoreError::Route(e) => Self::RouteTable {
                reason: e.to_string(),
            },
            CoreError::Api { message, status } => Self::Api { message, status },
            CoreError::Storage { message } => Self::Storage { message },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other),
        }
    }
}

impl CliError {
    /// Fill in the configured request timeout on a timeout error.
    pub fn with_timeout(self, seconds: u64) -> Self {
        match self {
            Self::Timeout { .. } => Self::Timeout { seconds },
            other => other,
        }
    }
}
