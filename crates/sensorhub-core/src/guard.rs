// ── Navigation guard ──
//
// Decides whether a navigation may proceed. Evaluation is synchronous and
// reads only the persisted credentials; the server is never consulted.

use sensorhub_api::CredentialStore;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::routes::RouteGuard;

/// State of the persisted user record, as far as the guard cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRecord {
    Missing,
    /// Present but not a JSON object.
    Unreadable,
    Parsed { is_admin: bool },
}

/// Persisted credentials read once per navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialSnapshot {
    pub has_token: bool,
    pub user: UserRecord,
}

impl CredentialSnapshot {
    pub fn read(storage: &dyn CredentialStore) -> Self {
        Self {
            has_token: storage.token().is_some(),
            user: storage
                .user_record()
                .as_deref()
                .map_or(UserRecord::Missing, parse_user_record),
        }
    }
}

fn parse_user_record(raw: &str) -> UserRecord {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => UserRecord::Parsed {
            is_admin: map.get("is_admin").is_some_and(is_truthy),
        },
        _ => {
            debug!("persisted user record is not a JSON object");
            UserRecord::Unreadable
        }
    }
}

// Older backends send `1`/`0`.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}

/// Why a navigation was sent to the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginReason {
    Unauthenticated,
    UnreadableUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    Proceed,
    RedirectToLogin { reason: LoginReason },
    RedirectToDashboard,
}

/// Evaluate a route's requirements against the persisted credentials.
pub fn evaluate(guard: RouteGuard, credentials: &CredentialSnapshot) -> GuardDecision {
    if !guard.requires_auth && !guard.requires_admin {
        return GuardDecision::Proceed;
    }
    if !credentials.has_token {
        return GuardDecision::RedirectToLogin {
            reason: LoginReason::Unauthenticated,
        };
    }
    if !guard.requires_admin {
        return GuardDecision::Proceed;
    }
    match credentials.user {
        UserRecord::Parsed { is_admin: true } => GuardDecision::Proceed,
        UserRecord::Parsed { is_admin: false } | UserRecord::Missing => {
            GuardDecision::RedirectToDashboard
        }
        UserRecord::Unreadable => GuardDecision::RedirectToLogin {
            reason: LoginReason::UnreadableUser,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sensorhub_api::{MemoryStore, TOKEN_KEY, USER_KEY};

    fn snapshot(token: bool, user: Option<&str>) -> CredentialSnapshot {
        let store = MemoryStore::new();
        if token {
            store.set(TOKEN_KEY, "tok").unwrap();
        }
        if let Some(user) = user {
            store.set(USER_KEY, user).unwrap();
        }
        CredentialSnapshot::read(&store)
    }

    #[test]
    fn public_routes_always_proceed() {
        assert_eq!(
            evaluate(RouteGuard::PUBLIC, &snapshot(false, None)),
            GuardDecision::Proceed
        );
    }

    #[test]
    fn anonymous_is_sent_to_login() {
        assert_eq!(
            evaluate(RouteGuard::AUTHENTICATED, &snapshot(false, Some(r#"{"is_admin":true}"#))),
            GuardDecision::RedirectToLogin {
                reason: LoginReason::Unauthenticated
            }
        );
    }

    #[test]
    fn non_admin_is_sent_to_dashboard() {
        let creds = snapshot(true, Some(r#"{"id":1,"is_admin":false}"#));
        assert_eq!(evaluate(RouteGuard::AUTHENTICATED, &creds), GuardDecision::Proceed);
        assert_eq!(evaluate(RouteGuard::ADMIN, &creds), GuardDecision::RedirectToDashboard);
        assert_eq!(
            evaluate(RouteGuard::ADMIN, &snapshot(true, None)),
            GuardDecision::RedirectToDashboard
        );
    }

    #[test]
    fn malformed_user_record_is_no_session() {
        assert_eq!(
            evaluate(RouteGuard::ADMIN, &snapshot(true, Some("{oops"))),
            GuardDecision::RedirectToLogin {
                reason: LoginReason::UnreadableUser
            }
        );
    }

    #[test]
    fn admin_flag_accepts_numeric_truth() {
        assert_eq!(
            evaluate(RouteGuard::ADMIN, &snapshot(true, Some(r#"{"is_admin":1}"#))),
            GuardDecision::Proceed
        );
    }
}
