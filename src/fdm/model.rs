use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::FdmError;

/// Kinematic performance envelope for an aircraft type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AircraftModel {
    pub name: String,
    #[serde(default = "default_climb_rate")]
    pub climb_rate_fpm: f64,
    #[serde(default = "default_descent_rate")]
    pub descent_rate_fpm: f64, // positive value
    #[serde(default = "default_turn_rate")]
    pub turn_rate_dps: f64,
    #[serde(default = "default_acceleration")]
    pub acceleration_fps2: f64,
    #[serde(default)]
    pub min_airspeed_fps: f64,
    #[serde(default = "default_max_airspeed")]
    pub max_airspeed_fps: f64,
}

fn default_climb_rate() -> f64 {
    2000.0
}

fn default_descent_rate() -> f64 {
    2000.0
}

fn default_turn_rate() -> f64 {
    3.0 // standard rate turn
}

fn default_acceleration() -> f64 {
    2.5
}

fn default_max_airspeed() -> f64 {
    1000.0
}

impl AircraftModel {
    /// Load `<root>/aircraft/<name>.json`
    pub fn load<P: AsRef<Path>>(root: P, name: &str) -> Result<Self, FdmError> {
        let path = root.as_ref().join("aircraft").join(format!("{}.json", name));
        if !path.exists() {
            return Err(FdmError::ModelNotFound(path));
        }

        let contents = fs::read_to_string(&path).map_err(|source| FdmError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| FdmError::Parse { path, source })
    }

    /// Vertical speed in ft/s needed to move from `altitude` toward `target`
    pub fn vertical_rate_fps(&self, altitude: f64, target: f64) -> f64 {
        if target > altitude {
            self.climb_rate_fpm / 60.0
        } else if target < altitude {
            -self.descent_rate_fpm / 60.0
        } else {
            0.0
        }
    }

    pub fn clamp_airspeed(&self, airspeed: f64) -> f64 {
        airspeed.clamp(self.min_airspeed_fps, self.max_airspeed_fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let model: AircraftModel = serde_json::from_str(r#"{ "name": "test" }"#).unwrap();
        assert_eq!(model.turn_rate_dps, 3.0);
        assert_eq!(model.min_airspeed_fps, 0.0);
    }

    #[test]
    fn test_vertical_rate() {
        let model: AircraftModel = serde_json::from_str(
            r#"{ "name": "test", "climb_rate_fpm": 3000, "descent_rate_fpm": 1200 }"#,
        )
        .unwrap();

        assert_eq!(model.vertical_rate_fps(1000.0, 2000.0), 50.0);
        assert_eq!(model.vertical_rate_fps(2000.0, 1000.0), -20.0);
        assert_eq!(model.vertical_rate_fps(1000.0, 1000.0), 0.0);
    }

    #[test]
    fn test_missing_model() {
        let err = AircraftModel::load("no/such/root", "787-8").unwrap_err();
        assert!(matches!(err, FdmError::ModelNotFound(_)));
    }
}
