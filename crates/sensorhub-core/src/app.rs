// ── Application root ──
//
// Wires storage, HTTP client, notification bus, session store, router
// and navigator together and runs the startup sequence.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sensorhub_api::{ApiClient, AuthEventHandler, CredentialStore};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::CoreError;
use crate::navigator::{LOGIN_PATH, Navigator};
use crate::notify::NotificationBus;
use crate::routes::{BootstrapStatus, Router};
use crate::session::{SessionState, SessionStore, VerifyOutcome};

const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";
const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";

/// What `App::start` found.
#[derive(Debug, Clone, Serialize)]
pub struct StartupReport {
    pub session: SessionState,
    /// `None` when startup verification is disabled.
    pub verify: Option<VerifyOutcome>,
    pub routes: BootstrapStatus,
    pub route_count: usize,
}

/// One running client application.
///
/// Dropping it stops the storage listener and detaches the auth handler
/// from the HTTP client.
pub struct App {
    config: AppConfig,
    api: Arc<ApiClient>,
    notifications: NotificationBus,
    session: SessionStore,
    router: Arc<Router>,
    navigator: Navigator,
    cancel: CancellationToken,
    listening: AtomicBool,
}

impl App {
    /// Build the HTTP client from `config` and wire everything to `storage`.
    pub fn new(config: AppConfig, storage: Arc<dyn CredentialStore>) -> Result<Self, CoreError> {
        let api = ApiClient::new(config.api_url.clone(), storage, &config.transport())?;
        Ok(Self::with_api(config, api))
    }

    /// Wire an already-built client.
    pub fn with_api(config: AppConfig, api: ApiClient) -> Self {
        let api = Arc::new(api);
        let notifications = NotificationBus::new(config.notifications);
        let session = SessionStore::new(Arc::clone(&api), notifications.clone());
        let router = Arc::new(Router::new());
        let navigator = Navigator::new(
            Arc::clone(&router),
            Arc::clone(api.storage()),
            notifications.clone(),
        );

        Self {
            config,
            api,
            notifications,
            session,
            router,
            navigator,
            cancel: CancellationToken::new(),
            listening: AtomicBool::new(false),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn notifications(&self) -> &NotificationBus {
        &self.notifications
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    // ── Startup ──────────────────────────────────────────────────────

    /// Read the persisted session, load the dynamic routes, install the
    /// 401/403 handler and verify the token.
    ///
    /// Route loading and verification failures are reported, not returned.
    pub async fn start(&self) -> StartupReport {
        self.session.initialize();

        if !self.listening.swap(true, Ordering::SeqCst) {
            self.session.spawn_storage_listener(self.cancel.child_token());
        }

        self.install_auth_handler();
        let routes = self.router.bootstrap(&self.api).await;

        let verify = if self.config.verify_on_start {
            Some(self.session.verify().await)
        } else {
            None
        };

        let report = StartupReport {
            session: self.session.state(),
            verify,
            routes,
            route_count: self.router.table().len(),
        };
        info!(
            session = %report.session,
            routes = report.route_count,
            dynamic = report.routes.is_loaded(),
            "application ready"
        );
        report
    }

    /// Route 401/403 responses from the API client into this app's
    /// session, navigator and notifications. Replaces any earlier handler;
    /// `shutdown` detaches it.
    pub fn install_auth_handler(&self) {
        self.api.set_auth_handler(Arc::new(AppAuthHandler {
            session: self.session.clone(),
            navigator: self.navigator.clone(),
            notifications: self.notifications.clone(),
        }));
    }

    /// Stop background work. Also done on drop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.api.clear_auth_handler();
        debug!("application shut down");
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ── Auth interception ────────────────────────────────────────────────

/// Turns 401/403 responses into session resets, notifications and
/// navigation.
struct AppAuthHandler {
    session: SessionStore,
    navigator: Navigator,
    notifications: NotificationBus,
}

impl AuthEventHandler for AppAuthHandler {
    fn session_expired(&self) {
        self.session.initialize();
        if self.navigator.current_location() == LOGIN_PATH {
            return;
        }
        self.notifications.warning(SESSION_EXPIRED);
        if let Err(e) = self.navigator.navigate(LOGIN_PATH) {
            warn!(error = %e, "failed to navigate to login");
        }
    }

    fn permission_denied(&self) {
        self.notifications.error(PERMISSION_DENIED);
    }
}
