//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod groups;
pub mod routes;

use crate::cli::{Command, GlobalOpts};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

/// Dispatch a backend-bound command to its handler.
///
/// Notifications raised while the command ran are printed to stderr
/// afterwards, whether or not it succeeded.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = Context::open(global)?;

    let result = match cmd {
        Command::Login(args) => auth::login(&ctx, args, global).await,
        Command::Logout => auth::logout(&ctx, global).await,
        Command::Status => auth::status(&ctx, global).await,
        Command::Routes(args) => routes::list(&ctx, &args, global).await,
        Command::Navigate(args) => routes::navigate(&ctx, &args, global).await,
        Command::Groups => groups::list(&ctx, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    };

    output::print_notifications(
        &ctx.app.notifications().snapshot(),
        &global.color,
        global.quiet,
    );
    result.map_err(|e| e.with_timeout(ctx.config.timeout))
}
