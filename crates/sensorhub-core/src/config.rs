// ── Runtime application configuration ──
//
// These types describe *how* to reach the SensorHub API and how long
// notifications stay visible. They never touch disk: the CLI (via
// sensorhub-config) builds an `AppConfig` and hands it in.

use std::time::Duration;

use url::Url;

use crate::notify::NotificationKind;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed development backends).
    DangerAcceptInvalid,
}

/// Default lifetime of a notification, per kind. Zero means "until dismissed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationDefaults {
    pub success: Duration,
    pub info: Duration,
    pub warning: Duration,
    pub error: Duration,
}

impl NotificationDefaults {
    pub fn timeout_for(&self, kind: NotificationKind) -> Duration {
        match kind {
            NotificationKind::Success => self.success,
            NotificationKind::Info => self.info,
            NotificationKind::Warning => self.warning,
            NotificationKind::Error => self.error,
        }
    }
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            success: Duration::from_millis(5000),
            info: Duration::from_millis(5000),
            warning: Duration::from_millis(5000),
            error: Duration::from_millis(8000),
        }
    }
}

/// Configuration for one application instance.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// API root (e.g. `http://localhost:8000/api`).
    pub api_url: Url,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Notification lifetimes.
    pub notifications: NotificationDefaults,
    /// Verify a persisted token with the server during startup.
    pub verify_on_start: bool,
}

impl AppConfig {
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            notifications: NotificationDefaults::default(),
            verify_on_start: true,
        }
    }

    pub(crate) fn transport(&self) -> sensorhub_api::TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => sensorhub_api::TlsMode::System,
            TlsVerification::CustomCa(path) => sensorhub_api::TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => sensorhub_api::TlsMode::DangerAcceptInvalid,
        };
        sensorhub_api::TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
