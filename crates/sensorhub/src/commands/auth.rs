//! Session commands: login, logout, status.

use dialoguer::Input;
use serde::Serialize;

use sensorhub_core::{
    BootstrapStatus, LoginCredentials, LoginOutcome, SessionState, StartupReport, User,
    VerifyOutcome,
};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

// ── Login ────────────────────────────────────────────────────────────

pub async fn login(ctx: &Context, args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let email = match args.email {
        Some(email) => email,
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(prompt_err)?,
    };
    let password = match args.password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ").map_err(prompt_err)?,
    };

    let outcome = ctx
        .app
        .session()
        .login(&LoginCredentials::new(email, password))
        .await;

    match outcome {
        LoginOutcome::Success { user, .. } => {
            let out = output::render_single(
                &global.output,
                &user,
                |u| match u {
                    Some(u) => format!("Signed in as {} <{}>", u.display_name(), u.email),
                    None => "Signed in".into(),
                },
                |u| u.as_ref().map(|u| u.email.clone()).unwrap_or_default(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
        LoginOutcome::Invalid { errors, .. } => Err(CliError::AuthFailed {
            message: errors
                .iter()
                .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
                .collect::<Vec<_>>()
                .join("; "),
        }),
        LoginOutcome::Failed { message } => Err(CliError::AuthFailed { message }),
    }
}

// ── Logout ───────────────────────────────────────────────────────────

/// Local credentials are always cleared; a failed server call only
/// shows up as a notification.
pub async fn logout(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let acknowledged = ctx.app.session().logout().await;
    tracing::debug!(acknowledged, "logout finished");
    output::print_output(
        &output::render_single(
            &global.output,
            &acknowledged,
            |_| "Signed out".into(),
            ToString::to_string,
        ),
        global.quiet,
    );
    Ok(())
}

// ── Status ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct StatusView {
    api_url: String,
    state: SessionState,
    user: Option<User>,
    verify: Option<VerifyOutcome>,
    routes: BootstrapStatus,
    route_count: usize,
}

impl StatusView {
    fn new(ctx: &Context, report: StartupReport) -> Self {
        Self {
            api_url: ctx.app.config().api_url.to_string(),
            state: report.session,
            user: ctx.app.session().snapshot().user,
            verify: report.verify,
            routes: report.routes,
            route_count: report.route_count,
        }
    }
}

pub async fn status(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let report = ctx.app.start().await;
    let view = StatusView::new(ctx, report);
    let out = output::render_single(&global.output, &view, status_detail, |v| {
        v.state.to_string()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

fn status_detail(v: &StatusView) -> String {
    let user = v.user.as_ref().map_or_else(
        || "-".to_owned(),
        |u| format!("{} <{}>", u.display_name(), u.email),
    );
    let admin = v
        .user
        .as_ref()
        .map_or_else(|| "-".to_owned(), |u| u.is_admin.to_string());
    let verify = match &v.verify {
        None => "skipped".to_owned(),
        Some(VerifyOutcome::Valid) => "valid".to_owned(),
        Some(VerifyOutcome::Revoked) => "revoked".to_owned(),
        Some(VerifyOutcome::Unreachable { reason }) => format!("unreachable ({reason})"),
        Some(VerifyOutcome::NotAuthenticated) => "no token".to_owned(),
    };
    let routes = match &v.routes {
        BootstrapStatus::Loaded { groups, routes } => {
            format!("{} ({routes} from {groups} sensor groups)", v.route_count)
        }
        BootstrapStatus::Unavailable { reason } => {
            format!("{} (static only: {reason})", v.route_count)
        }
        BootstrapStatus::Rejected { error } => {
            format!("{} (static only: {error})", v.route_count)
        }
    };

    output::detail_lines(&[
        ("API", v.api_url.clone()),
        ("Session", v.state.to_string()),
        ("User", user),
        ("Admin", admin),
        ("Token", verify),
        ("Routes", routes),
    ])
}
