// ── Route table ──
//
// Navigable routes: a fixed static part plus per-group and per-sensor
// entries derived from the server's sensor-group listing. Tables are
// immutable once built; the `Router` publishes a new one atomically.

mod builder;
mod router;
mod table;

use serde::Serialize;
use strum::Display;
use thiserror::Error;

use sensorhub_api::Sensor;

pub use builder::{DYNAMIC_PREFIXES, RouteTableBuilder};
pub use router::{BootstrapStatus, Router};
pub use table::{MAX_REDIRECTS, Resolution, RouteTable};

/// Path of the catch-all entry.
pub const CATCH_ALL_PATH: &str = "*";

// ── Guard flags ──────────────────────────────────────────────────────

/// Access requirements attached to a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RouteGuard {
    pub requires_auth: bool,
    pub requires_admin: bool,
}

impl RouteGuard {
    pub const PUBLIC: Self = Self {
        requires_auth: false,
        requires_admin: false,
    };
    pub const AUTHENTICATED: Self = Self {
        requires_auth: true,
        requires_admin: false,
    };
    pub const ADMIN: Self = Self {
        requires_auth: true,
        requires_admin: true,
    };
}

// ── Entries ──────────────────────────────────────────────────────────

/// Opaque reference to the screen a route renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum View {
    Dashboard,
    Groups,
    Statistics,
    Login,
    Register,
    Profile,
    Admin,
    AdminUsers,
    AdminSensors,
    AdminGroups,
    AdminStatistics,
    GroupOverview,
    SensorDetail,
}

/// Data handed to the view of a dynamic route.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteProps {
    #[default]
    None,
    Group {
        group_id: u64,
        group_name: String,
        group_value: String,
        sensors: Vec<Sensor>,
    },
    Sensor {
        group_value: String,
        sensor_type: String,
        display_name: String,
        unit_of_measurement: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteEntry {
    pub path: String,
    /// Unique across the table.
    pub name: String,
    pub view: Option<View>,
    pub redirect: Option<String>,
    pub guard: RouteGuard,
    pub props: RouteProps,
    /// Name of the enclosing route, for nested entries.
    pub parent: Option<String>,
}

impl RouteEntry {
    pub fn view(path: impl Into<String>, name: impl Into<String>, view: View, guard: RouteGuard) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            view: Some(view),
            redirect: None,
            guard,
            props: RouteProps::None,
            parent: None,
        }
    }

    pub fn redirect(path: impl Into<String>, name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            view: None,
            redirect: Some(target.into()),
            guard: RouteGuard::PUBLIC,
            props: RouteProps::None,
            parent: None,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn with_props(mut self, props: RouteProps) -> Self {
        self.props = props;
        self
    }

    pub fn is_dynamic(&self) -> bool {
        !matches!(self.props, RouteProps::None)
    }
}

// ── Errors ───────────────────────────────────────────────────────────

/// Rejected route registration.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteError {
    #[error("duplicate route name '{name}'")]
    DuplicateName { name: String },

    #[error("duplicate route path '{path}'")]
    DuplicatePath { path: String },

    #[error("invalid path segment '{value}'")]
    InvalidSegment { value: String },

    #[error("redirect loop at '{path}'")]
    RedirectLoop { path: String },
}
