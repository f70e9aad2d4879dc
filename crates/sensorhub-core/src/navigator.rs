// ── Navigator ──
//
// Resolves a location against the published route table, runs the guard
// and records where the user ended up.

use std::sync::Arc;

use sensorhub_api::CredentialStore;
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::error::CoreError;
use crate::guard::{self, CredentialSnapshot, GuardDecision};
use crate::notify::NotificationBus;
use crate::routes::{RouteEntry, Router};

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

const LOGIN_REQUIRED: &str = "Please log in to access this page";
const ADMIN_REQUIRED: &str = "You need administrator rights to access this page";

/// Where a navigation ended up and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Navigation {
    pub requested: String,
    pub location: String,
    pub route: RouteEntry,
    pub decision: GuardDecision,
    /// The final location differs from the requested one.
    pub redirected: bool,
}

#[derive(Clone)]
pub struct Navigator {
    inner: Arc<NavigatorInner>,
}

struct NavigatorInner {
    router: Arc<Router>,
    storage: Arc<dyn CredentialStore>,
    notifications: NotificationBus,
    location: watch::Sender<String>,
}

impl Navigator {
    pub fn new(
        router: Arc<Router>,
        storage: Arc<dyn CredentialStore>,
        notifications: NotificationBus,
    ) -> Self {
        let (location, _) = watch::channel("/".to_owned());
        Self {
            inner: Arc::new(NavigatorInner {
                router,
                storage,
                notifications,
                location,
            }),
        }
    }

    pub fn current_location(&self) -> String {
        self.inner.location.borrow().clone()
    }

    /// Navigate to `path`, applying redirects and the route's guard.
    ///
    /// A guard redirect queues one notification.
    pub fn navigate(&self, path: &str) -> Result<Navigation, CoreError> {
        let table = self.inner.router.table();
        let target = table.resolve(path)?;
        let credentials = CredentialSnapshot::read(self.inner.storage.as_ref());
        let decision = guard::evaluate(target.entry.guard, &credentials);

        let (location, route) = match decision {
            GuardDecision::Proceed => (target.path.clone(), target.entry.clone()),
            GuardDecision::RedirectToLogin { reason } => {
                debug!(path = %target.path, ?reason, "guard redirect to login");
                self.inner.notifications.warning(LOGIN_REQUIRED);
                let login = table.resolve(LOGIN_PATH)?;
                (login.path, login.entry.clone())
            }
            GuardDecision::RedirectToDashboard => {
                debug!(path = %target.path, "guard redirect to dashboard");
                self.inner.notifications.warning(ADMIN_REQUIRED);
                let dashboard = table.resolve(DASHBOARD_PATH)?;
                (dashboard.path, dashboard.entry.clone())
            }
        };

        let redirected = decision != GuardDecision::Proceed || !target.redirected_from.is_empty();
        self.inner.location.send_replace(location.clone());

        Ok(Navigation {
            requested: path.to_owned(),
            location,
            route,
            decision,
            redirected,
        })
    }
}
