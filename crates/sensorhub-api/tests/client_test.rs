#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sensorhub_api::{
    ApiClient, AuthEventHandler, CredentialStore, Error, LoginCredentials, MemoryStore,
    Normalized, StorageChange, TOKEN_KEY, USER_KEY,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient, Arc<MemoryStore>) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/api", server.uri())).unwrap();
    let storage = Arc::new(MemoryStore::new());
    let client = ApiClient::with_client(reqwest::Client::new(), base_url, storage.clone());
    (server, client, storage)
}

#[derive(Default)]
struct CountingHandler {
    expired: AtomicUsize,
    denied: AtomicUsize,
}

impl AuthEventHandler for CountingHandler {
    fn session_expired(&self) {
        self.expired.fetch_add(1, Ordering::SeqCst);
    }

    fn permission_denied(&self) {
        self.denied.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Request phase ───────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_token_attached_when_stored() {
    let (server, client, storage) = setup().await;
    storage.set(TOKEN_KEY, "secret-token").unwrap();

    Mock::given(method("GET"))
        .and(path("/api/auth/verify-token"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"valid": true})))
        .expect(1)
        .mount(&server)
        .await;

    client.verify_token().await.unwrap();
}

#[tokio::test]
async fn test_no_authorization_header_without_token() {
    let (server, client, _storage) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/sensor-groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    client.list_sensor_groups().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

// ── Response phase ──────────────────────────────────────────────────

#[tokio::test]
async fn test_sensor_groups_unwrapped_from_data() {
    let (server, client, _storage) = setup().await;

    let body = json!({
        "data": [{
            "id": 1,
            "group_name": "Weather",
            "group_value": "weather",
            "image_path": "/img/weather.png",
            "sensors": [
                {"id": 10, "sensor_name": "t", "type": "temperature", "display_name": "Temperature", "unit_of_measurement": "°C"},
                {"id": 11, "sensor_name": "h", "type": "humidity", "display_name": "Humidity", "unit_of_measurement": "%"}
            ]
        }]
    });

    Mock::given(method("GET"))
        .and(path("/api/sensor-groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let groups = client.list_sensor_groups().await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].group_value, "weather");
    assert_eq!(groups[0].sensors[1].sensor_type, "humidity");
}

#[tokio::test]
async fn test_paginated_listing() {
    let (server, client, _storage) = setup().await;

    let body = json!({
        "data": [{"id": 1}, {"id": 2}],
        "current_page": 1,
        "last_page": 3,
        "total": 6,
        "per_page": 2
    });

    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let normalized = client.get("admin/users").await.unwrap();
    let Normalized::Paginated(page) = normalized else {
        panic!("expected paginated response");
    };
    assert_eq!(page.current_page, 1);
    assert_eq!(page.last_page, 3);
    assert_eq!(page.data.len(), 2);
}

#[tokio::test]
async fn test_login_posts_credentials() {
    let (server, client, _storage) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "ada@example.com", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "success",
            "token": "tok-1",
            "user": {"id": 1, "name": "Ada", "is_admin": false},
            "message": "Welcome back"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client
        .login(&LoginCredentials::new("ada@example.com", "hunter2"))
        .await
        .unwrap();
    assert!(resp.is_success());
    assert_eq!(resp.token.as_deref(), Some("tok-1"));
    assert_eq!(resp.user.unwrap().name, "Ada");
}

#[tokio::test]
async fn test_logout_tolerates_empty_body() {
    let (server, client, _storage) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let resp = client.logout().await.unwrap();
    assert!(resp.message.is_none());
}

// ── Error phase ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_validation_errors() {
    let (server, client, _storage) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "The given data was invalid.",
            "errors": {
                "email": ["The email field must be a valid email address."],
                "password": ["The password field is required."]
            }
        })))
        .mount(&server)
        .await;

    let err = client
        .login(&LoginCredentials::new("nope", ""))
        .await
        .unwrap_err();

    let errors = err.field_errors().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(
        errors.get_index(0).unwrap().1[0],
        "The email field must be a valid email address."
    );
}

#[tokio::test]
async fn test_unauthorized_clears_credentials_once_then_forbidden_does_not() {
    let (server, client, storage) = setup().await;
    storage.store_credentials("stale", Some(r#"{"id":1}"#)).unwrap();

    let handler = Arc::new(CountingHandler::default());
    client.set_auth_handler(handler.clone());
    let mut events = storage.subscribe();

    Mock::given(method("GET"))
        .and(path("/api/auth/verify-token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthenticated."})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/stats"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = client.verify_token().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(storage.token().is_none());
    assert!(storage.get(USER_KEY).unwrap().is_none());
    assert_eq!(handler.expired.load(Ordering::SeqCst), 1);

    let err = client.get("admin/stats").await.unwrap_err();
    assert!(err.is_forbidden());
    assert_eq!(handler.denied.load(Ordering::SeqCst), 1);
    assert_eq!(handler.expired.load(Ordering::SeqCst), 1);

    let mut token_removals = 0;
    while let Ok(event) = events.try_recv() {
        if event.key == TOKEN_KEY && event.change == StorageChange::Removed {
            token_removals += 1;
        }
    }
    assert_eq!(token_removals, 1);
}

/// Serve one response whose headers promise more body than is sent,
/// then hang up. Returns the `/api` base URL.
async fn serve_truncated(status_line: &'static str) -> Url {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0_u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let head = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: 512\r\n\r\n{{\"mess"
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
    });
    Url::parse(&format!("http://{addr}/api")).unwrap()
}

#[tokio::test]
async fn test_unauthorized_with_truncated_body_still_clears_credentials() {
    let storage = Arc::new(MemoryStore::new());
    storage.store_credentials("stale", Some(r#"{"id":1}"#)).unwrap();
    let base_url = serve_truncated("401 Unauthorized").await;
    let client = ApiClient::with_client(reqwest::Client::new(), base_url, storage.clone());
    let handler = Arc::new(CountingHandler::default());
    client.set_auth_handler(handler.clone());

    let err = client.verify_token().await.unwrap_err();
    assert!(err.is_unauthorized(), "got {err:?}");
    assert!(storage.token().is_none());
    assert!(storage.get(USER_KEY).unwrap().is_none());
    assert_eq!(handler.expired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_forbidden_with_truncated_body_still_reports_denial() {
    let storage = Arc::new(MemoryStore::new());
    storage.store_credentials("valid", None).unwrap();
    let base_url = serve_truncated("403 Forbidden").await;
    let client = ApiClient::with_client(reqwest::Client::new(), base_url, storage.clone());
    let handler = Arc::new(CountingHandler::default());
    client.set_auth_handler(handler.clone());

    let err = client.get("admin/users").await.unwrap_err();
    assert!(err.is_forbidden(), "got {err:?}");
    assert_eq!(handler.denied.load(Ordering::SeqCst), 1);
    assert_eq!(storage.token().as_deref(), Some("valid"));
}

#[tokio::test]
async fn test_forbidden_keeps_credentials() {
    let (server, client, storage) = setup().await;
    storage.store_credentials("valid", None).unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = client.get("admin/users").await.unwrap_err();
    assert!(err.is_forbidden());
    assert_eq!(storage.token().as_deref(), Some("valid"));
}

#[tokio::test]
async fn test_server_error_passed_through() {
    let (server, client, storage) = setup().await;
    storage.store_credentials("valid", None).unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"message": "maintenance"})))
        .mount(&server)
        .await;

    match client.get("sensor-groups").await {
        Err(Error::Api {
            status, ref message, ..
        }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
    assert_eq!(storage.token().as_deref(), Some("valid"));
}

#[tokio::test]
async fn test_invalid_json_is_deserialization_error() {
    let (server, client, _storage) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let err = client.get("sensor-groups").await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_connection_refused_is_transient() {
    let storage = Arc::new(MemoryStore::new());
    let client = ApiClient::with_client(
        reqwest::Client::new(),
        Url::parse("http://127.0.0.1:9/api").unwrap(),
        storage,
    );
    let err = client.verify_token().await.unwrap_err();
    assert!(err.is_transient(), "got {err:?}");
}
