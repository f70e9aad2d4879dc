// SensorHub HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, bearer-token injection,
// envelope normalization, and 401/403 interception. Endpoint modules
// (auth, sensors) are inherent methods in separate files so this module
// stays focused on transport mechanics.

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};
use url::Url;

use crate::envelope::{self, Normalized, Page};
use crate::error::Error;
use crate::models::FieldErrors;
use crate::storage::CredentialStore;
use crate::transport::TransportConfig;

/// Reacts to authorization failures seen by any request.
///
/// Installed once the application can navigate (see
/// [`ApiClient::set_auth_handler`]). The client has already cleared the
/// persisted credentials before `session_expired` runs.
pub trait AuthEventHandler: Send + Sync {
    /// HTTP 401 on any request.
    fn session_expired(&self);
    /// HTTP 403 on any request.
    fn permission_denied(&self);
}

/// The single shared HTTP client of the application.
///
/// Request phase: attaches `Authorization: Bearer <token>` when the
/// credential store holds a token. Response phase: normalizes the envelope.
/// Error phase: 401 clears persisted credentials and notifies the auth
/// handler; 403 notifies the handler only; every other status is returned
/// to the caller as an [`Error`].
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    storage: Arc<dyn CredentialStore>,
    auth_handler: RwLock<Option<Arc<dyn AuthEventHandler>>>,
}

impl ApiClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the API root (e.g. `https://sensors.example.com/api`);
    /// endpoint paths are appended to it.
    pub fn new(
        base_url: Url,
        storage: Arc<dyn CredentialStore>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, storage))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        storage: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            http,
            base_url,
            storage,
            auth_handler: RwLock::new(None),
        }
    }

    /// The API root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The credential store shared with the rest of the application.
    pub fn storage(&self) -> &Arc<dyn CredentialStore> {
        &self.storage
    }

    // ── Auth handler ────────────────────────────────────────────────

    /// Install the handler invoked on 401/403 responses, replacing any
    /// previous one.
    pub fn set_auth_handler(&self, handler: Arc<dyn AuthEventHandler>) {
        *self
            .auth_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    /// Remove the installed handler. 401s still clear credentials.
    pub fn clear_auth_handler(&self) {
        *self
            .auth_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn auth_handler(&self) -> Option<Arc<dyn AuthEventHandler>> {
        self.auth_handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ── URL builders ────────────────────────────────────────────────

    /// Build a full URL for an API path: `{base}/{path}`.
    pub(crate) fn endpoint_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ─────────────────────────────────────────────

    /// Send a GET request and normalize the response.
    pub async fn get(&self, path: &str) -> Result<Normalized, Error> {
        let url = self.endpoint_url(path)?;
        debug!("GET {}", url);
        self.send(self.http.get(url)).await
    }

    /// Send a POST request with a JSON body and normalize the response.
    pub async fn post(&self, path: &str, body: &(impl Serialize + Sync)) -> Result<Normalized, Error> {
        let url = self.endpoint_url(path)?;
        debug!("POST {}", url);
        self.send(self.http.post(url).json(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> Result<Normalized, Error> {
        let url = self.endpoint_url(path)?;
        debug!("POST {}", url);
        self.send(self.http.post(url)).await
    }

    /// GET and decode the normalized payload into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let normalized = self.get(path).await?;
        decode_payload(normalized, |n| n.decode())
    }

    /// GET a listing and decode it into a page of `T`.
    pub async fn get_page<T: DeserializeOwned>(&self, path: &str) -> Result<Page<T>, Error> {
        let normalized = self.get(path).await?;
        decode_payload(normalized, Normalized::decode_page)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.storage.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Normalized, Error> {
        let resp = self.authorize(builder).send().await?;
        self.handle_response(resp).await
    }

    /// Classify the status, run the interception side effects, and
    /// normalize successful bodies.
    async fn handle_response(&self, resp: reqwest::Response) -> Result<Normalized, Error> {
        let status = resp.status();

        // Interception runs before the body is read; a body that fails to
        // arrive must not skip it.
        if status == StatusCode::UNAUTHORIZED {
            self.on_unauthorized();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Unauthorized {
                message: error_message(&body),
            });
        }

        if status == StatusCode::FORBIDDEN {
            warn!("request forbidden (HTTP 403)");
            if let Some(handler) = self.auth_handler() {
                handler.permission_denied();
            }
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Forbidden {
                message: error_message(&body),
            });
        }

        let body = resp.text().await?;

        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }

        if body.trim().is_empty() {
            return Ok(Normalized::Bare(Value::Null));
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })?;

        trace!(%status, "response decoded");
        Ok(envelope::normalize(value))
    }

    fn on_unauthorized(&self) {
        let cleared = self.storage.clear_credentials();
        debug!(cleared, "unauthorized (HTTP 401)");
        if let Some(handler) = self.auth_handler() {
            handler.session_expired();
        }
    }
}

fn decode_payload<T>(
    normalized: Normalized,
    decode: impl FnOnce(Normalized) -> Result<T, serde_json::Error>,
) -> Result<T, Error> {
    let fallback = normalized.clone();
    decode(normalized).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: fallback.into_value().to_string(),
    })
}

/// The `message` field of an error body, if the body is JSON and has one.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(String::from)
}

/// Build the error for a non-success status other than 401/403.
///
/// Bodies carrying an `errors` object are validation failures; everything
/// else is passed through as `Error::Api`.
fn classify_failure(status: StatusCode, body: &str) -> Error {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .map_or_else(
            || {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_owned()
            },
            String::from,
        );

    if let Some(errors) = parsed
        .as_ref()
        .and_then(|v| v.get("errors"))
        .and_then(Value::as_object)
    {
        return Error::Validation {
            message,
            status: status.as_u16(),
            errors: field_errors(errors),
        };
    }

    Error::Api {
        status: status.as_u16(),
        message,
        body: parsed,
    }
}

/// Accept `{ field: ["msg", ..] }` as well as `{ field: "msg" }`.
fn field_errors(errors: &serde_json::Map<String, Value>) -> FieldErrors {
    errors
        .iter()
        .map(|(field, messages)| {
            let messages = match messages {
                Value::Array(items) => items
                    .iter()
                    .map(|m| m.as_str().map_or_else(|| m.to_string(), String::from))
                    .collect(),
                Value::String(s) => vec![s.clone()],
                other => vec![other.to_string()],
            };
            (field.clone(), messages)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn endpoint_url_joins_without_losing_base_path() {
        let client = ApiClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://localhost:8000/api/").unwrap(),
            Arc::new(MemoryStore::new()),
        );
        assert_eq!(
            client.endpoint_url("/auth/login").unwrap().as_str(),
            "http://localhost:8000/api/auth/login"
        );
        assert_eq!(
            client.endpoint_url("sensor-groups").unwrap().as_str(),
            "http://localhost:8000/api/sensor-groups"
        );
    }

    #[test]
    fn validation_bodies_keep_field_order() {
        let body = r#"{"message":"The given data was invalid.","errors":{"email":["The email field is required."],"password":"Too short"}}"#;
        let err = classify_failure(StatusCode::UNPROCESSABLE_ENTITY, body);
        let errors = err.field_errors().unwrap();
        let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
        assert_eq!(fields, ["email", "password"]);
        assert_eq!(errors["password"], vec!["Too short".to_string()]);
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn non_json_failures_use_status_reason() {
        let err = classify_failure(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        match err {
            Error::Api {
                status,
                message,
                body,
            } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
                assert!(body.is_none());
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
