//! Async HTTP client for the SensorHub backend API.
//!
//! - **[`ApiClient`]** -- the single shared client: bearer-token injection
//!   from a [`CredentialStore`], envelope normalization, and 401/403
//!   interception through an installable [`AuthEventHandler`].
//! - **[`envelope`]** -- folds plain, `data`-wrapped and paginated bodies
//!   into [`Normalized`].
//! - **[`storage`]** -- the persisted `auth_token` / `user` keys, with
//!   in-memory and JSON-file backends.

pub mod auth;
pub mod client;
pub mod envelope;
pub mod error;
pub mod models;
mod sensors;
pub mod storage;
pub mod transport;

pub use auth::LoginCredentials;
pub use client::{ApiClient, AuthEventHandler};
pub use envelope::{Normalized, Page, normalize};
pub use error::Error;
pub use models::{FieldErrors, Locale, LoginResponse, LogoutResponse, Sensor, SensorGroup, User};
pub use storage::{
    CredentialStore, FileStore, MemoryStore, StorageChange, StorageEvent, TOKEN_KEY, USER_KEY,
};
pub use transport::{TlsMode, TransportConfig};
