// ── Session store ──
//
// Authentication state derived from the persisted credentials and the
// server's verdict on the token. Lifecycle operations (login, logout,
// verify) never return an error; they classify failures into typed
// outcomes and user-facing notifications.

use std::sync::Arc;

use secrecy::SecretString;
use sensorhub_api::{
    ApiClient, CredentialStore, Error as ApiError, FieldErrors, LoginCredentials, StorageEvent,
    TOKEN_KEY, User,
};
use serde::Serialize;
use strum::Display;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::notify::NotificationBus;

const LOGIN_SUCCESS: &str = "Login successful";
const LOGIN_FAILED: &str = "Login failed. Please check your credentials and try again.";
const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again.";
const LOGOUT_SUCCESS: &str = "Logout successful";
const LOGOUT_FAILED: &str = "Logout unsuccessful";

// ── State ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    Anonymous,
    /// Token sent to the server for verification.
    Verifying,
    Authenticated,
}

/// The current session. A token is present exactly when the state is not
/// `Anonymous`; a user only ever accompanies a token.
#[derive(Debug, Clone)]
pub struct Session {
    pub state: SessionState,
    pub token: Option<SecretString>,
    pub user: Option<User>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self {
            state: SessionState::Anonymous,
            token: None,
            user: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }
}

// ── Outcomes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Success { user: Option<User>, message: String },
    /// Field-level validation failure, fields in server order.
    Invalid { errors: FieldErrors, message: String },
    Failed { message: String },
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. }
            | Self::Invalid { message, .. }
            | Self::Failed { message } => message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VerifyOutcome {
    /// Server accepted the token.
    Valid,
    /// Server rejected the token; credentials are gone.
    Revoked,
    /// Verification failed for another reason; the session is kept.
    Unreachable { reason: String },
    /// No token to verify.
    NotAuthenticated,
}

// ── SessionStore ─────────────────────────────────────────────────────

/// Owns the session. Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: Arc<ApiClient>,
    notifications: NotificationBus,
    session: watch::Sender<Session>,
    in_flight: Mutex<()>,
}

impl SessionStore {
    /// Create a store and read the persisted credentials.
    pub fn new(api: Arc<ApiClient>, notifications: NotificationBus) -> Self {
        let (session, _) = watch::channel(Session::anonymous());
        let store = Self {
            inner: Arc::new(SessionInner {
                api,
                notifications,
                session,
                in_flight: Mutex::new(()),
            }),
        };
        store.initialize();
        store
    }

    fn storage(&self) -> &Arc<dyn CredentialStore> {
        self.inner.api.storage()
    }

    pub fn snapshot(&self) -> Session {
        self.inner.session.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.inner.session.borrow().state
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.session.subscribe()
    }

    /// Rebuild the session from persisted storage.
    ///
    /// A stored token means `Authenticated` until the server says
    /// otherwise. An unparsable user record is dropped from the session.
    pub fn initialize(&self) -> Session {
        let session = match self.storage().token() {
            None => Session::anonymous(),
            Some(token) => Session {
                state: SessionState::Authenticated,
                token: Some(SecretString::from(token)),
                user: self.read_user(),
            },
        };
        debug!(state = %session.state, has_user = session.user.is_some(), "session initialized");
        self.inner.session.send_replace(session.clone());
        session
    }

    fn read_user(&self) -> Option<User> {
        let raw = self.storage().user_record()?;
        serde_json::from_str(&raw)
            .inspect_err(|e| warn!(error = %e, "persisted user record is unreadable"))
            .ok()
    }

    fn set_state(&self, state: SessionState) {
        self.inner.session.send_if_modified(|s| {
            if s.token.is_none() || s.state == state {
                return false;
            }
            s.state = state;
            true
        });
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Ask the server whether the token is still good.
    ///
    /// Rejection drops the session; any other failure keeps it.
    pub async fn verify(&self) -> VerifyOutcome {
        let _guard = self.inner.in_flight.lock().await;

        if !self.inner.session.borrow().is_authenticated() {
            return VerifyOutcome::NotAuthenticated;
        }

        self.set_state(SessionState::Verifying);
        match self.inner.api.verify_token().await {
            Ok(()) => {
                self.set_state(SessionState::Authenticated);
                VerifyOutcome::Valid
            }
            Err(e) if e.is_unauthorized() => {
                info!("stored token rejected by server");
                self.storage().clear_credentials();
                self.inner.session.send_replace(Session::anonymous());
                VerifyOutcome::Revoked
            }
            Err(e) => {
                warn!(error = %e, transient = e.is_transient(), "token verification failed; keeping session");
                self.set_state(SessionState::Authenticated);
                VerifyOutcome::Unreachable {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Initialize from storage, then verify if a token was found.
    pub async fn check_on_startup(&self) -> VerifyOutcome {
        self.initialize();
        self.verify().await
    }

    /// Submit credentials and, on success, persist the new session.
    pub async fn login(&self, credentials: &LoginCredentials) -> LoginOutcome {
        let _guard = self.inner.in_flight.lock().await;
        let bus = &self.inner.notifications;

        let response = match self.inner.api.login(credentials).await {
            Ok(response) => response,
            Err(e) => {
                let outcome = classify_login_error(e);
                bus.error(outcome.message());
                return outcome;
            }
        };

        if !response.is_success() {
            let message = response.message.unwrap_or_else(|| LOGIN_FAILED.to_owned());
            bus.error(&message);
            return LoginOutcome::Failed { message };
        }

        let token = response.token.unwrap_or_default();
        let user_json = response.user.as_ref().and_then(|user| {
            serde_json::to_string(user)
                .inspect_err(|e| warn!(error = %e, "failed to encode user record"))
                .ok()
        });

        if let Err(e) = self.storage().store_credentials(&token, user_json.as_deref()) {
            warn!(error = %e, "failed to persist credentials");
            bus.error(UNEXPECTED_ERROR);
            return LoginOutcome::Failed {
                message: UNEXPECTED_ERROR.to_owned(),
            };
        }

        self.inner.session.send_replace(Session {
            state: SessionState::Authenticated,
            token: Some(SecretString::from(token)),
            user: response.user.clone(),
        });

        let message = response.message.unwrap_or_else(|| LOGIN_SUCCESS.to_owned());
        info!(email = %credentials.email, "logged in");
        bus.success(&message);
        LoginOutcome::Success {
            user: response.user,
            message,
        }
    }

    /// End the session. Local credentials are cleared whether or not the
    /// server call succeeds. Returns `true` if the server acknowledged.
    pub async fn logout(&self) -> bool {
        let _guard = self.inner.in_flight.lock().await;
        let result = self.inner.api.logout().await;

        self.storage().clear_credentials();
        self.inner.session.send_replace(Session::anonymous());

        match result {
            Ok(response) => {
                info!("logged out");
                self.inner
                    .notifications
                    .success(response.message.unwrap_or_else(|| LOGOUT_SUCCESS.to_owned()));
                true
            }
            Err(e) => {
                warn!(error = %e, "logout request failed");
                self.inner.notifications.error(LOGOUT_FAILED);
                false
            }
        }
    }

    // ── Cross-handle sync ────────────────────────────────────────────

    /// Re-read storage when another handle changed the token. Returns
    /// `true` if the event was relevant.
    pub fn handle_storage_event(&self, event: &StorageEvent) -> bool {
        if event.key != TOKEN_KEY {
            return false;
        }
        debug!(change = ?event.change, "token changed in storage");
        self.initialize();
        true
    }

    /// Apply every storage event until `cancel` fires.
    pub fn spawn_storage_listener(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let store = self.clone();
        let mut events = self.storage().subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(event) => {
                            store.handle_storage_event(&event);
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            debug!(missed, "storage listener lagged; resyncing");
                            store.initialize();
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        })
    }
}

fn classify_login_error(err: ApiError) -> LoginOutcome {
    match err {
        ApiError::Validation {
            errors, message, ..
        } => {
            let first = errors
                .values()
                .flat_map(|messages| messages.iter())
                .next()
                .cloned()
                .unwrap_or(message);
            LoginOutcome::Invalid {
                errors,
                message: first,
            }
        }
        other if other.status().is_some() => {
            debug!(error = %other, "login rejected");
            LoginOutcome::Failed {
                message: LOGIN_FAILED.to_owned(),
            }
        }
        other => {
            warn!(error = %other, "login request failed");
            LoginOutcome::Failed {
                message: UNEXPECTED_ERROR.to_owned(),
            }
        }
    }
}
