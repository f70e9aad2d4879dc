use std::sync::Arc;

use arc_swap::ArcSwap;
use sensorhub_api::{ApiClient, SensorGroup};
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::{RouteError, RouteTable, RouteTableBuilder};

/// Result of the one-time route bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BootstrapStatus {
    /// Sensor-group routes are installed.
    Loaded { groups: usize, routes: usize },
    /// The listing could not be fetched; the static table stays.
    Unavailable { reason: String },
    /// The listing produced colliding or invalid routes; the static table stays.
    Rejected { error: RouteError },
}

impl BootstrapStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

/// Holds the published route table.
///
/// Starts with the static routes; `bootstrap` swaps in the full table
/// once. Readers always see a complete table.
pub struct Router {
    table: ArcSwap<RouteTable>,
    bootstrap: OnceCell<BootstrapStatus>,
}

impl Router {
    pub fn new() -> Self {
        Self::with_table(RouteTableBuilder::with_static_routes().build())
    }

    pub fn with_table(table: RouteTable) -> Self {
        Self {
            table: ArcSwap::from_pointee(table),
            bootstrap: OnceCell::new(),
        }
    }

    /// The currently published table.
    pub fn table(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    /// `true` once `bootstrap` has finished, whatever its outcome.
    pub fn is_ready(&self) -> bool {
        self.bootstrap.initialized()
    }

    /// The bootstrap outcome, if it has run.
    pub fn bootstrap_status(&self) -> Option<&BootstrapStatus> {
        self.bootstrap.get()
    }

    /// Fetch the sensor groups and install their routes. Runs once;
    /// later calls return the first outcome.
    pub async fn bootstrap(&self, api: &ApiClient) -> BootstrapStatus {
        self.bootstrap
            .get_or_init(|| async {
                match api.list_sensor_groups().await {
                    Ok(groups) => match self.install_groups(&groups) {
                        Ok(routes) => {
                            info!(groups = groups.len(), routes, "dynamic routes loaded");
                            BootstrapStatus::Loaded {
                                groups: groups.len(),
                                routes,
                            }
                        }
                        Err(error) => {
                            warn!(%error, "sensor group routes rejected");
                            BootstrapStatus::Rejected { error }
                        }
                    },
                    Err(e) => {
                        warn!(error = %e, "failed to load sensor groups");
                        BootstrapStatus::Unavailable {
                            reason: e.to_string(),
                        }
                    }
                }
            })
            .await
            .clone()
    }

    // Only reached from inside the `OnceCell` initializer, so the
    // load/build/store sequence never races another install.
    fn install_groups(&self, groups: &[SensorGroup]) -> Result<usize, RouteError> {
        let mut builder = RouteTableBuilder::from_table(&self.table.load());
        let added = builder.register_sensor_groups(groups)?;
        self.table.store(Arc::new(builder.build()));
        Ok(added)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
