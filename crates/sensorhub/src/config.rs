//! CLI configuration: thin wrapper around `sensorhub_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--api-url, --timeout, --insecure).

use std::sync::Arc;
use std::time::Duration;

use sensorhub_core::{App, AppConfig, CredentialStore, NotificationDefaults};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use sensorhub_config::{Config, config_path, load_config, save_config};

/// Apply flag overrides to a loaded config.
pub fn apply_overrides(mut cfg: Config, global: &GlobalOpts) -> Config {
    if let Some(ref url) = global.api_url {
        cfg.api_url.clone_from(url);
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout = timeout;
    }
    if global.insecure {
        cfg.insecure = true;
    }
    cfg
}

/// Config file + environment + flags.
pub fn resolve(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(apply_overrides(load_config()?, global))
}

/// Everything a command needs to talk to the backend.
pub struct Context {
    pub config: Config,
    pub app: App,
}

impl Context {
    pub fn open(global: &GlobalOpts) -> Result<Self, CliError> {
        let config = resolve(global)?;
        let mut app_config: AppConfig = config.to_app_config()?;
        // Notifications are printed when the command finishes.
        app_config.notifications = NotificationDefaults {
            success: Duration::ZERO,
            info: Duration::ZERO,
            warning: Duration::ZERO,
            error: Duration::ZERO,
        };
        let storage: Arc<dyn CredentialStore> = sensorhub_config::open_credential_store(&config);
        tracing::debug!(
            api_url = %app_config.api_url,
            backend = ?config.storage.backend,
            "opening application"
        );
        let app = App::new(app_config, storage)?;
        app.install_auth_handler();
        Ok(Self { config, app })
    }
}
