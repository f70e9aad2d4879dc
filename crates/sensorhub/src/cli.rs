//! Clap derive structures for the `sensorhub` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sensorhub -- terminal client for SensorHub
#[derive(Debug, Parser)]
#[command(
    name = "sensorhub",
    version,
    about = "Sign in to SensorHub and inspect its sensor groups and routes",
    long_about = "A command-line client for the SensorHub IoT dashboard backend.\n\n\
        Keeps a persisted session (token + user record), verifies it with the\n\
        server, and evaluates navigation against the static and sensor-group\n\
        route table exactly as the dashboard does.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// API root URL (overrides config)
    #[arg(long, short = 'u', env = "SENSORHUB_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SENSORHUB_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and persist the session
    Login(LoginArgs),

    /// End the session and clear persisted credentials
    Logout,

    /// Show the persisted session and verify it with the server
    #[command(alias = "whoami")]
    Status,

    /// List the navigable routes
    #[command(alias = "r")]
    Routes(RoutesArgs),

    /// Evaluate navigation to a path (guards and redirects)
    #[command(alias = "nav")]
    Navigate(NavigateArgs),

    /// List sensor groups and their sensors
    #[command(alias = "g")]
    Groups,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email (prompted if omitted)
    pub email: Option<String>,

    /// Password (prompted if omitted)
    #[arg(long, env = "SENSORHUB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct RoutesArgs {
    /// Skip fetching sensor groups; list the static routes only
    #[arg(long)]
    pub static_only: bool,

    /// Show only routes generated from sensor groups
    #[arg(long, conflicts_with = "static_only")]
    pub dynamic: bool,
}

#[derive(Debug, Args)]
pub struct NavigateArgs {
    /// Target path, e.g. /admin/users
    pub path: String,

    /// Skip fetching sensor groups; resolve against the static routes only
    #[arg(long)]
    pub static_only: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file with guided setup
    Init,

    /// Display the resolved configuration
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
