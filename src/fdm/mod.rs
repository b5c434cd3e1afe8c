mod kinematic;
mod model;
mod properties;
mod script;

use std::path::PathBuf;
use thiserror::Error;

use crate::waypoints::WaypointError;

pub use kinematic::KinematicFdm;
pub use model::AircraftModel;
pub use properties::PropertyTree;
pub use script::{InitialConditions, RunScript};

#[derive(Debug, Error)]
pub enum FdmError {
    #[error("aircraft model not found: {0:?}")]
    ModelNotFound(PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no aircraft model loaded")]
    NoModel,

    #[error("no script loaded")]
    NoScript,

    #[error("initial conditions not applied")]
    NotInitialized,

    #[error(transparent)]
    Waypoints(#[from] WaypointError),
}

/// The slice of a flight dynamics engine the runner drives.
///
/// Mirrors the executive interface of script-driven engines: load a model and a
/// script, apply initial conditions, then step frame by frame.
pub trait FlightDynamics {
    fn load_model(&mut self, name: &str) -> Result<(), FdmError>;

    /// Load initial conditions, overriding any set by the script
    fn load_ic(&mut self, path: &str) -> Result<(), FdmError>;

    fn load_script(&mut self, path: &str) -> Result<(), FdmError>;

    fn run_ic(&mut self) -> Result<(), FdmError>;

    /// Advance one frame. `Ok(false)` once the script has finished.
    fn run(&mut self) -> Result<bool, FdmError>;

    /// Frame duration in seconds
    fn delta_t(&self) -> f64;

    fn sim_time(&self) -> f64;

    fn hold(&mut self);

    fn resume(&mut self);

    fn holding(&self) -> bool;

    /// Resume for `steps` frames, then hold again
    fn enable_increment_then_hold(&mut self, steps: u32);

    fn check_incremental_hold(&mut self);

    /// Human readable summary of the loaded configuration
    fn configuration(&self) -> String;

    fn get_property(&self, name: &str) -> Option<f64>;

    fn set_property(&mut self, name: &str, value: f64);
}
