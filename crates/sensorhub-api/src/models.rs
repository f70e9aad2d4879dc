// SensorHub API response types
//
// Records exchanged with the backend. Fields use `#[serde(default)]`
// liberally: the backend omits optional fields rather than sending null,
// and older deployments do not send every field.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Field name -> validation messages, in the order the server sent them.
pub type FieldErrors = IndexMap<String, Vec<String>>;

// ── User ─────────────────────────────────────────────────────────────

/// The signed-in user, as returned by `POST /auth/login` and persisted
/// under the `user` storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub email_verified_at: Option<String>,
    #[serde(default)]
    pub locale: Option<Locale>,
    #[serde(default, deserialize_with = "truthy")]
    pub is_admin: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Fields we don't model, kept so a persisted record round-trips.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    /// "Name Surname", or the email when both are empty.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.name, self.surname);
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_owned()
        }
    }
}

// Older backends send `1`/`0` for flags.
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        _ => false,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    pub value: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub symbol: String,
}

// ── Sensors ──────────────────────────────────────────────────────────

/// A sensor group from `GET /sensor-groups`, with its nested sensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorGroup {
    pub id: u64,
    pub group_name: String,
    /// URL-safe identifier used in route paths.
    pub group_value: String,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub sensors: Vec<Sensor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: u64,
    #[serde(default)]
    pub sensor_name: String,
    #[serde(rename = "type")]
    pub sensor_type: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub unit_of_measurement: String,
    #[serde(default)]
    pub icon_path: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub color_class: Option<String>,
    #[serde(default)]
    pub group_id: Option<u64>,
}

// ── Auth ─────────────────────────────────────────────────────────────

/// Reply of `POST /auth/login`:
/// ```json
/// { "type": "success", "token": "...", "user": {...}, "message": "..." }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub message: Option<String>,
}

impl LoginResponse {
    /// `type == "success"` and a non-empty token.
    pub fn is_success(&self) -> bool {
        self.kind.as_deref() == Some("success") && self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Reply of `POST /auth/logout`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogoutResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_keeps_unknown_fields() {
        let raw = json!({
            "id": 7,
            "name": "Ada",
            "surname": "Lovelace",
            "email": "ada@example.com",
            "is_admin": true,
            "theme": "dark"
        });
        let user: User = serde_json::from_value(raw).unwrap();
        assert!(user.is_admin);
        assert_eq!(user.display_name(), "Ada Lovelace");
        assert_eq!(user.extra.get("theme"), Some(&json!("dark")));

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["theme"], json!("dark"));
    }

    #[test]
    fn user_accepts_numeric_admin_flag_and_missing_fields() {
        let user: User = serde_json::from_value(json!({"id": 1, "is_admin": 1})).unwrap();
        assert!(user.is_admin);
        assert_eq!(user.id, 1);

        let user: User = serde_json::from_value(json!({"is_admin": 0})).unwrap();
        assert!(!user.is_admin);
        assert_eq!(user.id, 0);

        let user: User = serde_json::from_value(json!({"name": "Ada", "is_admin": null})).unwrap();
        assert!(!user.is_admin);
    }

    #[test]
    fn login_response_requires_token_and_success_type() {
        let ok: LoginResponse =
            serde_json::from_value(json!({"type": "success", "token": "t"})).unwrap();
        assert!(ok.is_success());

        let no_token: LoginResponse =
            serde_json::from_value(json!({"type": "success", "token": ""})).unwrap();
        assert!(!no_token.is_success());

        let failed: LoginResponse =
            serde_json::from_value(json!({"type": "error", "message": "nope"})).unwrap();
        assert!(!failed.is_success());
    }

    #[test]
    fn sensor_group_decodes_nested_sensors() {
        let raw = json!({
            "id": 1,
            "group_name": "Weather",
            "group_value": "weather",
            "sensors": [{
                "id": 10,
                "sensor_name": "bme280_temp",
                "type": "temperature",
                "display_name": "Temperature",
                "unit_of_measurement": "°C"
            }]
        });
        let group: SensorGroup = serde_json::from_value(raw).unwrap();
        assert_eq!(group.sensors.len(), 1);
        assert_eq!(group.sensors[0].sensor_type, "temperature");
        assert!(group.image_path.is_none());
    }
}
