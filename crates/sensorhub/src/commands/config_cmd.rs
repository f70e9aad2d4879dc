//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};

use sensorhub_config::{StorageBackend, StorageConfig};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = config::resolve(global)?;
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("{c:#?}\n# {e}")),
                |c| c.api_url.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_path();
    let base = config::load_config().unwrap_or_default();
    eprintln!("SensorHub CLI configuration");
    eprintln!("   Config path: {}\n", path.display());

    // 1. API URL
    let api_url: String = Input::new()
        .with_prompt("API URL")
        .default(
            global
                .api_url
                .clone()
                .unwrap_or_else(|| base.api_url.clone()),
        )
        .validate_with(|input: &String| -> Result<(), String> {
            Config {
                api_url: input.clone(),
                ..Config::default()
            }
            .to_app_config()
            .map(|_| ())
            .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Credential storage
    let backends = [
        ("JSON file in the data directory", StorageBackend::File),
        ("System keyring", StorageBackend::Keyring),
        ("Memory only (sign in on every run)", StorageBackend::Memory),
    ];
    let labels: Vec<&str> = backends.iter().map(|(label, _)| *label).collect();
    let current = backends
        .iter()
        .position(|(_, b)| *b == base.storage.backend)
        .unwrap_or(0);
    let selection = Select::new()
        .with_prompt("Where should the session be stored?")
        .items(&labels)
        .default(current)
        .interact()
        .map_err(prompt_err)?;
    let backend = backends.get(selection).map_or(StorageBackend::File, |(_, b)| *b);

    // 3. Startup verification
    let verify_on_start = Confirm::new()
        .with_prompt("Verify the stored token with the server on startup?")
        .default(base.verify_on_start)
        .interact()
        .map_err(prompt_err)?;

    let cfg = Config {
        api_url,
        insecure: global.insecure || base.insecure,
        verify_on_start,
        storage: StorageConfig {
            backend,
            path: base.storage.path.clone(),
        },
        ..base
    };
    cfg.to_app_config()?;

    let written = config::save_config(&cfg)?;
    eprintln!("\n✓ Configuration written to {}", written.display());
    eprintln!("\n  Sign in with: sensorhub login");
    Ok(())
}
