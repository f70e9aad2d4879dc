//! Shared configuration for SensorHub tools.
//!
//! TOML config file, environment overrides, translation to
//! `sensorhub_core::AppConfig`, and selection of the credential storage
//! backend (JSON file, system keyring or memory).

mod keyring_store;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sensorhub_api::{CredentialStore, FileStore, MemoryStore};
use sensorhub_core::{AppConfig, NotificationDefaults, TlsVerification};

pub use keyring_store::KeyringStore;

/// Environment variable prefix; nested keys use `__` (`SENSORHUB_STORAGE__BACKEND`).
pub const ENV_PREFIX: &str = "SENSORHUB_";

const KEYRING_SERVICE: &str = "sensorhub";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// API root, e.g. `http://localhost:8000/api`.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Verify a persisted token with the server on startup.
    #[serde(default = "default_true")]
    pub verify_on_start: bool,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
            verify_on_start: true,
            storage: StorageConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8000/api".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

/// Where the `auth_token` / `user` keys are persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON file under the data directory.
    #[default]
    File,
    /// System keyring.
    Keyring,
    /// Process memory; nothing survives exit.
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Override the credential file location (file backend only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Notification lifetimes in milliseconds. Zero keeps a notification
/// until it is dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct NotificationConfig {
    #[serde(default = "default_short_ms")]
    pub success_ms: u64,
    #[serde(default = "default_short_ms")]
    pub info_ms: u64,
    #[serde(default = "default_short_ms")]
    pub warning_ms: u64,
    #[serde(default = "default_error_ms")]
    pub error_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            success_ms: default_short_ms(),
            info_ms: default_short_ms(),
            warning_ms: default_short_ms(),
            error_ms: default_error_ms(),
        }
    }
}

fn default_short_ms() -> u64 {
    5000
}
fn default_error_ms() -> u64 {
    8000
}

impl From<NotificationConfig> for NotificationDefaults {
    fn from(cfg: NotificationConfig) -> Self {
        Self {
            success: Duration::from_millis(cfg.success_ms),
            info: Duration::from_millis(cfg.info_ms),
            warning: Duration::from_millis(cfg.warning_ms),
            error: Duration::from_millis(cfg.error_ms),
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("io", "sensorhub", "sensorhub")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory holding the credential file.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

fn home_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("sensorhub");
    p
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load the config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path` + environment. A missing file is fine.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    Ok(config)
}

// ── Saving ──────────────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Build the runtime configuration.
    pub fn to_app_config(&self) -> Result<AppConfig, ConfigError> {
        let api_url: url::Url = self.api_url.parse().map_err(|e| ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL '{}': {e}", self.api_url),
        })?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                field: "api_url".into(),
                reason: format!("unsupported scheme '{}'", api_url.scheme()),
            });
        }

        let tls = if self.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else {
            TlsVerification::SystemDefaults
        };

        Ok(AppConfig {
            api_url,
            tls,
            timeout: Duration::from_secs(self.timeout),
            notifications: self.notifications.into(),
            verify_on_start: self.verify_on_start,
        })
    }

    /// Credential file used by the file backend.
    pub fn credentials_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| data_dir().join("credentials.json"))
    }
}

/// Open the credential store selected by `storage.backend`.
pub fn open_credential_store(cfg: &Config) -> Arc<dyn CredentialStore> {
    match cfg.storage.backend {
        StorageBackend::File => Arc::new(FileStore::new(cfg.credentials_path())),
        StorageBackend::Keyring => Arc::new(KeyringStore::new(KEYRING_SERVICE)),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_translate_to_strict_tls() {
        let app = Config::default().to_app_config().unwrap();
        assert_eq!(app.api_url.as_str(), "http://localhost:8000/api");
        assert_eq!(app.tls, TlsVerification::SystemDefaults);
        assert_eq!(app.notifications, NotificationDefaults::default());
        assert!(app.verify_on_start);
    }

    #[test]
    fn insecure_wins_over_ca_cert() {
        let cfg = Config {
            insecure: true,
            ca_cert: Some(PathBuf::from("/etc/ca.pem")),
            ..Config::default()
        };
        assert_eq!(
            cfg.to_app_config().unwrap().tls,
            TlsVerification::DangerAcceptInvalid
        );
    }

    #[test]
    fn bad_url_is_a_validation_error() {
        let cfg = Config {
            api_url: "ftp://example.com".into(),
            ..Config::default()
        };
        assert!(matches!(
            cfg.to_app_config(),
            Err(ConfigError::Validation { ref field, .. }) if field == "api_url"
        ));
    }

    #[test]
    fn storage_path_override() {
        let cfg = Config {
            storage: StorageConfig {
                backend: StorageBackend::File,
                path: Some(PathBuf::from("/tmp/creds.json")),
            },
            ..Config::default()
        };
        assert_eq!(cfg.credentials_path(), PathBuf::from("/tmp/creds.json"));
    }
}
