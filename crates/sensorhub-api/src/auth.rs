// Authentication endpoints
//
// Bearer-token login/logout/verification. The token returned by login is
// persisted by the caller (the session store); this module only speaks
// HTTP.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{LoginResponse, LogoutResponse};

/// Email/password pair submitted to `POST /auth/login`.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub email: String,
    pub password: SecretString,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl ApiClient {
    /// Submit credentials.
    ///
    /// A 2xx reply is returned as-is, even when `type` is not `"success"`;
    /// the caller decides what a non-success reply means. Field-level
    /// validation failures come back as [`Error::Validation`].
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse, Error> {
        debug!(email = %credentials.email, "logging in");

        let body = json!({
            "email": credentials.email,
            "password": credentials.password.expose_secret(),
        });

        let normalized = self.post("auth/login", &body).await?;
        normalized.decode().map_err(|e| Error::Deserialization {
            message: format!("invalid login response: {e}"),
            body: String::new(),
        })
    }

    /// End the server-side session for the current token.
    pub async fn logout(&self) -> Result<LogoutResponse, Error> {
        debug!("logging out");
        let normalized = self.post_empty("auth/logout").await?;
        // Some deployments answer 204; treat any body we can't read as empty.
        Ok(normalized.decode().unwrap_or_default())
    }

    /// Ask the server whether the current token is still valid.
    ///
    /// `Ok(())` on any 2xx; a revoked token surfaces as
    /// [`Error::Unauthorized`] (and has already cleared the stored credentials).
    pub async fn verify_token(&self) -> Result<(), Error> {
        self.get("auth/verify-token").await?;
        debug!("token verified");
        Ok(())
    }
}
