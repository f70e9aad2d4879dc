//! Sensor group listing.

use tabled::Tabled;

use sensorhub_core::{CoreError, SensorGroup};

use crate::cli::GlobalOpts;
use crate::config::Context;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Group")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Sensors")]
    sensors: String,
}

impl From<&SensorGroup> for GroupRow {
    fn from(g: &SensorGroup) -> Self {
        Self {
            id: g.id,
            name: g.group_name.clone(),
            value: g.group_value.clone(),
            sensors: g
                .sensors
                .iter()
                .map(|s| s.sensor_type.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

pub async fn list(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let groups = ctx
        .app
        .api()
        .list_sensor_groups()
        .await
        .map_err(CoreError::from)?;

    let out = output::render_list(&global.output, &groups, |g| GroupRow::from(g), |g| {
        g.group_value.clone()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
