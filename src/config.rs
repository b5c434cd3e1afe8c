use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use anyhow::{Result, Context};

/// Pacing options for the real-time runner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub sleep_period: f64, // seconds, used when not running in real time
    pub realtime: bool,
    pub nice: bool,
    pub suspend: bool,
    pub end: f64, // stop once sim time passes this
    pub status_interval: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sleep_period: 0.1,
            realtime: true,
            nice: false,
            suspend: false,
            end: 1e99,
            status_interval: 5.0,
        }
    }
}

impl RunConfig {
    /// Period slept between iterations when `nice` is set
    pub fn nice_period(&self, frame_duration: f64) -> f64 {
        if self.realtime {
            frame_duration
        } else {
            self.sleep_period
        }
    }

    /// Reject periods that cannot be slept or ticked on
    pub fn validate(&self) -> Result<()> {
        for (name, secs) in [("sleep_period", self.sleep_period), ("status_interval", self.status_interval)] {
            Duration::try_from_secs_f64(secs)
                .with_context(|| format!("Invalid {}: {} seconds", name, secs))?;
        }
        Ok(())
    }
}

/// Constants used when turning a waypoint table into events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointConfig {
    pub wp_distance_ft: u32,
    pub feet_per_meter: f64,
    pub notify_caption: String,
    pub airspeed_tc: f64,
}

impl Default for WaypointConfig {
    fn default() -> Self {
        Self {
            wp_distance_ft: 700,
            feet_per_meter: 3.28084,
            notify_caption: "Distance to WP  ".to_string(),
            airspeed_tc: 1.0,
        }
    }
}

/// Settings file loaded from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub run: RunConfig,
    pub waypoints: WaypointConfig,
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {:?}", path))?;
        let settings: Settings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings JSON: {:?}", path))?;
        settings.run.validate()
            .with_context(|| format!("Invalid run settings: {:?}", path))?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.run.realtime);
        assert!(!settings.run.nice);
        assert_eq!(settings.run.end, 1e99);
        assert_eq!(settings.waypoints.wp_distance_ft, 700);
    }

    #[test]
    fn test_partial_settings() -> Result<()> {
        let settings: Settings = serde_json::from_str(
            r#"{ "run": { "realtime": false, "end": 120.0 } }"#,
        )?;

        assert!(!settings.run.realtime);
        assert_eq!(settings.run.end, 120.0);
        assert_eq!(settings.run.sleep_period, 0.1);
        assert_eq!(settings.waypoints.feet_per_meter, 3.28084);
        Ok(())
    }

    #[test]
    fn test_nice_period() {
        let mut run = RunConfig::default();
        assert_eq!(run.nice_period(0.0083), 0.0083);
        run.realtime = false;
        assert_eq!(run.nice_period(0.0083), 0.1);
    }

    #[test]
    fn test_oversized_periods_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("settings.json");

        fs::write(&path, r#"{ "run": { "sleep_period": 1e20 } }"#)?;
        assert!(Settings::load(&path).is_err());

        fs::write(&path, r#"{ "run": { "status_interval": 1e20 } }"#)?;
        assert!(Settings::load(&path).is_err());

        fs::write(&path, r#"{ "run": { "sleep_period": 0.5, "status_interval": 2.0 } }"#)?;
        assert_eq!(Settings::load(&path)?.run.sleep_period, 0.5);
        Ok(())
    }

    #[test]
    fn test_negative_period_rejected() {
        let run = RunConfig { sleep_period: -1.0, ..RunConfig::default() };
        assert!(run.validate().is_err());
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Settings::load("does/not/exist.json").is_err());
    }
}
