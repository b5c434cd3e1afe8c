mod events;
mod table;
pub mod xml;

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::WaypointConfig;

pub use events::{
    events_document, plan_events, waypoint_event, Comparison, Condition, Notify, Operand, Set,
    SetAction, WaypointEvent, ACTIVE_WAYPOINT, AIRSPEED_SETPOINT, ALTITUDE_SETPOINT,
    NOTIFY_TRIGGER, TARGET_LAT, TARGET_LON, WP_DISTANCE,
};
pub use table::{load_waypoint_table, parse_waypoint_table, Waypoint, WaypointRow};

#[derive(Debug, Error)]
pub enum WaypointError {
    #[error("failed to read waypoint table {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("waypoint table has no rows")]
    Empty,

    #[error("waypoint table is missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("line {line}: invalid {column} value '{value}'")]
    InvalidValue {
        line: usize,
        column: &'static str,
        value: String,
    },
}

/// Render the events XML for an in-memory table
pub fn render_events(rows: &[WaypointRow], config: &WaypointConfig) -> Result<String, WaypointError> {
    let events = plan_events(rows, config)?;
    Ok(xml::to_pretty_xml(&events_document(&events)))
}

/// Read a waypoint table and render its events document
pub fn convert_table<P: AsRef<Path>>(input: P, config: &WaypointConfig) -> Result<String, WaypointError> {
    let input = input.as_ref();
    let rows = load_waypoint_table(input)?;

    let start = rows[0].to_waypoint(config.feet_per_meter);
    info!(
        "[WAYPOINTS] Loaded {} rows from {:?}, start at {:.8} rad, {:.8} rad, {:.1} ft",
        rows.len(),
        input,
        start.lat_rad,
        start.lon_rad,
        start.altitude_ft
    );

    let events = plan_events(&rows, config)?;
    for event in events.iter().rev() {
        debug!("[WAYPOINTS] {}: {}", event.name, event.description);
    }
    info!("[WAYPOINTS] Built {} waypoint events", events.len());

    Ok(xml::to_pretty_xml(&events_document(&events)))
}
