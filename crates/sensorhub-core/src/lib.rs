// sensorhub-core: session, notification and routing controller between
// sensorhub-api and consumers (CLI).

pub mod app;
pub mod config;
pub mod error;
pub mod guard;
pub mod navigator;
pub mod notify;
pub mod routes;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use app::{App, StartupReport};
pub use config::{AppConfig, NotificationDefaults, TlsVerification};
pub use error::CoreError;
pub use guard::{CredentialSnapshot, GuardDecision, LoginReason, UserRecord};
pub use navigator::{DASHBOARD_PATH, LOGIN_PATH, Navigation, Navigator};
pub use notify::{Notification, NotificationBus, NotificationKind, NotificationStream};
pub use routes::{
    BootstrapStatus, RouteEntry, RouteError, RouteGuard, RouteProps, RouteTable,
    RouteTableBuilder, Router, View,
};
pub use session::{LoginOutcome, Session, SessionState, SessionStore, VerifyOutcome};

// Re-export the API types consumers need alongside the controller.
pub use sensorhub_api::{
    CredentialStore, FileStore, LoginCredentials, MemoryStore, SensorGroup, User,
};
