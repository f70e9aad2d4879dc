use sensorhub_api::SensorGroup;
use tracing::debug;

use super::{CATCH_ALL_PATH, RouteEntry, RouteError, RouteGuard, RouteProps, RouteTable, View};

/// Top-level sections that get one route per sensor group and sensor.
pub const DYNAMIC_PREFIXES: [&str; 2] = ["dashboard", "groups"];

/// Accumulates routes, rejecting name or path collisions.
#[derive(Debug, Clone, Default)]
pub struct RouteTableBuilder {
    table: RouteTable,
}

impl RouteTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue from an existing table.
    pub fn from_table(table: &RouteTable) -> Self {
        Self {
            table: table.clone(),
        }
    }

    /// The fixed navigation: public sections, auth pages, profile, the
    /// admin subtree and the catch-all.
    pub fn with_static_routes() -> Self {
        let mut builder = Self::new();
        for entry in static_routes() {
            // Static names and paths are distinct.
            if let Err(e) = builder.register(entry) {
                debug!(error = %e, "static route skipped");
            }
        }
        builder
    }

    /// Add one entry. Existing entries are never overwritten.
    pub fn register(&mut self, entry: RouteEntry) -> Result<(), RouteError> {
        self.table.insert(entry)
    }

    /// Add an overview route per `(prefix, group)` and a detail route per
    /// `(prefix, group, sensor)`.
    ///
    /// All-or-nothing: on the first collision nothing from `groups` is
    /// kept. Returns the number of routes added.
    pub fn register_sensor_groups(&mut self, groups: &[SensorGroup]) -> Result<usize, RouteError> {
        let mut staged = self.table.clone();
        let mut added = 0;

        for prefix in DYNAMIC_PREFIXES {
            for group in groups {
                check_segment(&group.group_value)?;
                let group_name = format!("{prefix}-{}", group.group_value);
                let group_path = format!("/{prefix}/{}", group.group_value);

                staged.insert(
                    RouteEntry::view(
                        group_path.clone(),
                        group_name.clone(),
                        View::GroupOverview,
                        RouteGuard::PUBLIC,
                    )
                    .with_parent(prefix)
                    .with_props(RouteProps::Group {
                        group_id: group.id,
                        group_name: group.group_name.clone(),
                        group_value: group.group_value.clone(),
                        sensors: group.sensors.clone(),
                    }),
                )?;
                added += 1;

                for sensor in &group.sensors {
                    check_segment(&sensor.sensor_type)?;
                    staged.insert(
                        RouteEntry::view(
                            format!("{group_path}/{}", sensor.sensor_type),
                            format!("{group_name}-{}", sensor.sensor_type),
                            View::SensorDetail,
                            RouteGuard::PUBLIC,
                        )
                        .with_parent(group_name.clone())
                        .with_props(RouteProps::Sensor {
                            group_value: group.group_value.clone(),
                            sensor_type: sensor.sensor_type.clone(),
                            display_name: sensor.display_name.clone(),
                            unit_of_measurement: sensor.unit_of_measurement.clone(),
                        }),
                    )?;
                    added += 1;
                }
            }
        }

        self.table = staged;
        debug!(groups = groups.len(), routes = added, "sensor group routes registered");
        Ok(added)
    }

    pub fn build(self) -> RouteTable {
        self.table
    }
}

fn check_segment(value: &str) -> Result<(), RouteError> {
    if value.trim().is_empty() || value.contains(['/', '?', '#']) {
        return Err(RouteError::InvalidSegment {
            value: value.to_owned(),
        });
    }
    Ok(())
}

fn static_routes() -> Vec<RouteEntry> {
    vec![
        RouteEntry::redirect("/", "root", "/dashboard"),
        RouteEntry::view("/dashboard", "dashboard", View::Dashboard, RouteGuard::PUBLIC),
        RouteEntry::view("/groups", "groups", View::Groups, RouteGuard::PUBLIC),
        RouteEntry::view("/statistics", "statistics", View::Statistics, RouteGuard::PUBLIC),
        RouteEntry::view("/login", "login", View::Login, RouteGuard::PUBLIC),
        RouteEntry::view("/register", "register", View::Register, RouteGuard::PUBLIC),
        RouteEntry::view("/profile", "profile", View::Profile, RouteGuard::AUTHENTICATED),
        RouteEntry::view("/admin", "admin", View::Admin, RouteGuard::ADMIN),
        RouteEntry::view("/admin/users", "admin-users", View::AdminUsers, RouteGuard::ADMIN)
            .with_parent("admin"),
        RouteEntry::view("/admin/sensors", "admin-sensors", View::AdminSensors, RouteGuard::ADMIN)
            .with_parent("admin"),
        RouteEntry::view("/admin/groups", "admin-groups", View::AdminGroups, RouteGuard::ADMIN)
            .with_parent("admin"),
        RouteEntry::view(
            "/admin/statistics",
            "admin-statistics",
            View::AdminStatistics,
            RouteGuard::ADMIN,
        )
        .with_parent("admin"),
        RouteEntry::redirect(CATCH_ALL_PATH, "not-found", "/"),
    ]
}
