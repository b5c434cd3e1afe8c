use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::FdmError;

/// Starting state of the aircraft
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialConditions {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_ft: f64,
    pub airspeed_fps: f64,
    #[serde(default)]
    pub heading_deg: f64,
}

impl InitialConditions {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FdmError> {
        read_json(path.as_ref())
    }
}

/// Run script: what to fly, for how long, along which waypoint table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunScript {
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_dt")]
    pub dt: f64,
    pub end_time: f64,
    #[serde(default)]
    pub initial: Option<InitialConditions>,
    /// Waypoint table, relative to the engine root
    pub waypoints: String,
    #[serde(default)]
    pub wp_distance_ft: Option<u32>,
}

fn default_dt() -> f64 {
    1.0 / 120.0
}

impl RunScript {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FdmError> {
        read_json(path.as_ref())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, FdmError> {
    let contents = fs::read_to_string(path).map_err(|source| FdmError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| FdmError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
