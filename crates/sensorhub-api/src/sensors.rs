// Sensor group endpoints

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::SensorGroup;

impl ApiClient {
    /// List all sensor groups with their nested sensors.
    ///
    /// Accepts a bare array, a `data`-wrapped array, or a paginated listing
    /// (only the returned page is used).
    pub async fn list_sensor_groups(&self) -> Result<Vec<SensorGroup>, Error> {
        let page = self.get_page::<SensorGroup>("sensor-groups").await?;
        debug!(count = page.data.len(), "fetched sensor groups");
        Ok(page.data)
    }
}
