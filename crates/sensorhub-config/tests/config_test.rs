#![allow(clippy::unwrap_used)]
// Config file + environment layering.

use std::path::Path;

use figment::Jail;
use pretty_assertions::assert_eq;

use sensorhub_config::{
    Config, StorageBackend, load_config_from, open_credential_store, save_config_to,
};

#[test]
fn test_missing_file_yields_defaults() {
    Jail::expect_with(|jail| {
        let cfg = load_config_from(&jail.directory().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        Ok(())
    });
}

#[test]
fn test_file_then_env_layering() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
                api_url = "https://sensors.example.com/api"
                timeout = 10

                [storage]
                backend = "keyring"

                [notifications]
                error_ms = 0
            "#,
        )?;
        jail.set_env("SENSORHUB_TIMEOUT", "45");
        jail.set_env("SENSORHUB_STORAGE__BACKEND", "memory");

        let cfg = load_config_from(Path::new("config.toml")).unwrap();
        assert_eq!(cfg.api_url, "https://sensors.example.com/api");
        assert_eq!(cfg.timeout, 45);
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert_eq!(cfg.notifications.error_ms, 0);
        assert_eq!(cfg.notifications.success_ms, 5000);
        Ok(())
    });
}

#[test]
fn test_save_then_load_keeps_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let cfg = Config {
        api_url: "http://10.0.0.5:8000/api".into(),
        insecure: true,
        ..Config::default()
    };

    save_config_to(&cfg, &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("api_url = \"http://10.0.0.5:8000/api\""));

    let loaded: Config = toml::from_str(&text).unwrap();
    assert_eq!(loaded, cfg);
}

#[test]
fn test_file_backend_writes_under_configured_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.storage.path = Some(dir.path().join("creds.json"));

    let store = open_credential_store(&cfg);
    store.store_credentials("tok", None).unwrap();
    assert!(dir.path().join("creds.json").exists());
    assert_eq!(store.token().as_deref(), Some("tok"));
}
