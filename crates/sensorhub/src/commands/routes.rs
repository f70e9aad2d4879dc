//! Route table commands: list routes, evaluate a navigation.

use tabled::Tabled;

use sensorhub_core::{BootstrapStatus, Navigation, RouteEntry, RouteGuard};

use crate::cli::{GlobalOpts, NavigateArgs, RoutesArgs};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

// ── Row types ────────────────────────────────────────────────────────

#[derive(Tabled)]
struct RouteRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Access")]
    access: &'static str,
    #[tabled(rename = "Parent")]
    parent: String,
}

fn access_label(guard: RouteGuard) -> &'static str {
    if guard.requires_admin {
        "admin"
    } else if guard.requires_auth {
        "signed in"
    } else {
        "public"
    }
}

fn target_label(entry: &RouteEntry) -> String {
    match (&entry.redirect, entry.view) {
        (Some(to), _) => format!("-> {to}"),
        (None, Some(view)) => view.to_string(),
        (None, None) => String::new(),
    }
}

impl From<&RouteEntry> for RouteRow {
    fn from(e: &RouteEntry) -> Self {
        Self {
            path: e.path.clone(),
            name: e.name.clone(),
            target: target_label(e),
            access: access_label(e.guard),
            parent: e.parent.clone().unwrap_or_default(),
        }
    }
}

/// Fetch sensor groups into the route table unless told not to. A failed
/// fetch leaves the static routes in place.
async fn load_routes(ctx: &Context, static_only: bool) {
    if static_only {
        return;
    }
    match ctx.app.router().bootstrap(ctx.app.api()).await {
        BootstrapStatus::Loaded { .. } => {}
        BootstrapStatus::Unavailable { reason } => {
            ctx.app
                .notifications()
                .warning(format!("Sensor groups unavailable, showing static routes: {reason}"));
        }
        BootstrapStatus::Rejected { error } => {
            ctx.app
                .notifications()
                .warning(format!("Sensor group routes rejected, showing static routes: {error}"));
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

pub async fn list(ctx: &Context, args: &RoutesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    load_routes(ctx, args.static_only).await;

    let table = ctx.app.router().table();
    let entries: Vec<&RouteEntry> = table
        .entries()
        .iter()
        .filter(|e| !args.dynamic || e.is_dynamic())
        .collect();

    let out = output::render_list(
        &global.output,
        &entries,
        |e| RouteRow::from(*e),
        |e| e.path.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn navigate(
    ctx: &Context,
    args: &NavigateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    load_routes(ctx, args.static_only).await;

    let nav = ctx.app.navigator().navigate(&args.path)?;
    let out = output::render_single(&global.output, &nav, navigation_detail, |n| {
        n.location.clone()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

fn navigation_detail(n: &Navigation) -> String {
    let decision = serde_json::to_value(n.decision)
        .ok()
        .and_then(|v| v.get("decision").and_then(|d| d.as_str()).map(str::to_owned))
        .unwrap_or_default();
    output::detail_lines(&[
        ("Requested", n.requested.clone()),
        ("Location", n.location.clone()),
        ("Route", n.route.name.clone()),
        ("Target", target_label(&n.route)),
        ("Guard", decision),
        ("Redirected", n.redirected.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use sensorhub_core::View;

    use super::*;

    #[test]
    fn row_labels() {
        let admin = RouteEntry::view("/admin", "admin", View::Admin, RouteGuard::ADMIN);
        let row = RouteRow::from(&admin);
        assert_eq!(row.access, "admin");
        assert_eq!(row.target, "admin");

        let root = RouteEntry::redirect("/", "root", "/dashboard");
        let row = RouteRow::from(&root);
        assert_eq!(row.access, "public");
        assert_eq!(row.target, "-> /dashboard");
    }
}
