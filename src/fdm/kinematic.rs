use std::f64::consts::{PI, TAU};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::WaypointConfig;
use crate::utils::navigation::{
    bearing_rad, destination_rad, haversine_rad, normalize_angle_rad, shortest_turn, EARTH_RADIUS_FT,
};
use crate::waypoints::{
    load_waypoint_table, plan_events, SetAction, WaypointEvent, ACTIVE_WAYPOINT, AIRSPEED_SETPOINT,
    ALTITUDE_SETPOINT, TARGET_LAT, TARGET_LON, WP_DISTANCE,
};
use super::{AircraftModel, FdmError, FlightDynamics, InitialConditions, PropertyTree, RunScript};

pub const LATITUDE: &str = "position/lat-gc-rad";
pub const LONGITUDE: &str = "position/long-gc-rad";
pub const ALTITUDE: &str = "position/h-sl-ft";
pub const AIRSPEED: &str = "velocities/vt-fps";
pub const HEADING: &str = "attitude/psi-rad";
pub const SIM_TIME: &str = "simulation/sim-time-sec";

/// Exponential approach of a property toward a value
#[derive(Debug, Clone)]
struct Transition {
    property: String,
    from: f64,
    to: f64,
    tc: f64,
    start: f64,
}

/// Point-mass engine flying the waypoint events of its script.
///
/// Airspeed, altitude and heading slew toward the autopilot setpoints within the
/// aircraft envelope. Position advances on a spherical earth.
pub struct KinematicFdm {
    root: PathBuf,
    waypoint_config: WaypointConfig,
    model: Option<AircraftModel>,
    script: Option<RunScript>,
    script_ic: Option<InitialConditions>,
    ic_override: Option<InitialConditions>,
    events: Vec<WaypointEvent>,
    fired: Vec<bool>,
    transitions: Vec<Transition>,
    props: PropertyTree,
    dt: f64,
    sim_time: f64,
    holding: bool,
    steps_until_hold: Option<u32>,
    initialized: bool,
}

impl KinematicFdm {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            waypoint_config: WaypointConfig::default(),
            model: None,
            script: None,
            script_ic: None,
            ic_override: None,
            events: Vec::new(),
            fired: Vec::new(),
            transitions: Vec::new(),
            props: PropertyTree::new(),
            dt: 1.0 / 120.0,
            sim_time: 0.0,
            holding: false,
            steps_until_hold: None,
            initialized: false,
        }
    }

    pub fn with_waypoint_config(mut self, config: WaypointConfig) -> Self {
        self.waypoint_config = config;
        self
    }

    pub fn events(&self) -> &[WaypointEvent] {
        &self.events
    }

    pub fn properties(&self) -> &PropertyTree {
        &self.props
    }

    fn initial_conditions(&self) -> Option<InitialConditions> {
        self.ic_override.or(self.script_ic)
    }

    fn advance_transitions(&mut self) {
        let now = self.sim_time;
        let props = &mut self.props;
        self.transitions.retain(|t| {
            let elapsed = now - t.start;
            if t.tc <= 0.0 || elapsed >= 5.0 * t.tc {
                props.set(&t.property, t.to);
                return false;
            }
            props.set(&t.property, t.to + (t.from - t.to) * (-elapsed / t.tc).exp());
            true
        });
    }

    fn evaluate_events(&mut self) {
        for (i, event) in self.events.iter().enumerate() {
            if self.fired[i] {
                continue;
            }

            let triggered = event
                .conditions
                .iter()
                .all(|c| c.comparison.holds(self.props.value(&c.property), c.operand.value()));
            if !triggered {
                continue;
            }

            self.fired[i] = true;
            info!("[FDM] Event '{}' fired at {:.2}s", event.name, self.sim_time);

            for set in &event.sets {
                let value = set.value.value();
                match set.action {
                    SetAction::Step => self.props.set(&set.property, value),
                    SetAction::Exp { tc } => {
                        self.transitions.retain(|t| t.property != set.property);
                        self.transitions.push(Transition {
                            property: set.property.clone(),
                            from: self.props.value(&set.property),
                            to: value,
                            tc,
                            start: self.sim_time,
                        });
                    }
                }
            }

            if let Some(ref notify) = event.notify {
                info!("[FDM]   {}{:.2}", notify.caption, self.props.value(&notify.property));
            }
        }
    }
}

/// Waypoint distance in feet from the current position to the guidance target
fn waypoint_distance(props: &PropertyTree) -> f64 {
    haversine_rad(
        props.value(LATITUDE),
        props.value(LONGITUDE),
        props.value(TARGET_LAT),
        props.value(TARGET_LON),
    ) * EARTH_RADIUS_FT
}

fn integrate(model: &AircraftModel, props: &mut PropertyTree, dt: f64) {
    // Airspeed
    let airspeed = props.value(AIRSPEED);
    let target_speed = model.clamp_airspeed(props.value(AIRSPEED_SETPOINT));
    let max_dv = model.acceleration_fps2 * dt;
    let airspeed = airspeed + (target_speed - airspeed).clamp(-max_dv, max_dv);

    // Altitude
    let altitude = props.value(ALTITUDE);
    let target_alt = props.value(ALTITUDE_SETPOINT);
    let rate = model.vertical_rate_fps(altitude, target_alt);
    let mut new_alt = altitude + rate * dt;
    if (rate > 0.0 && new_alt > target_alt) || (rate < 0.0 && new_alt < target_alt) {
        new_alt = target_alt;
    }

    // Heading toward the guidance target
    let lat = props.value(LATITUDE);
    let lon = props.value(LONGITUDE);
    let target_lat = props.value(TARGET_LAT);
    let target_lon = props.value(TARGET_LON);
    let mut heading = props.value(HEADING);
    if haversine_rad(lat, lon, target_lat, target_lon) > 0.0 {
        let desired = bearing_rad(lat, lon, target_lat, target_lon);
        let max_turn = model.turn_rate_dps.to_radians() * dt;
        heading = normalize_angle_rad(heading + shortest_turn(heading, desired).clamp(-max_turn, max_turn));
    }

    let (lat, lon) = destination_rad(lat, lon, heading, airspeed * dt / EARTH_RADIUS_FT);

    props.set(AIRSPEED, airspeed);
    props.set(ALTITUDE, new_alt);
    props.set(HEADING, heading);
    props.set(LATITUDE, lat);
    props.set(LONGITUDE, (lon + PI).rem_euclid(TAU) - PI);
}

impl FlightDynamics for KinematicFdm {
    fn load_model(&mut self, name: &str) -> Result<(), FdmError> {
        let model = AircraftModel::load(&self.root, name)?;
        info!("[FDM] Loaded aircraft model {}", model.name);
        self.model = Some(model);
        Ok(())
    }

    fn load_ic(&mut self, path: &str) -> Result<(), FdmError> {
        let ic = InitialConditions::load(self.root.join(path))?;
        debug!("[FDM] Initial conditions from {}: {:?}", path, ic);
        self.ic_override = Some(ic);
        Ok(())
    }

    fn load_script(&mut self, path: &str) -> Result<(), FdmError> {
        let script = RunScript::load(self.root.join(path))?;

        if self.model.is_none() {
            if let Some(ref model) = script.model {
                self.load_model(model)?;
            }
        }

        let rows = load_waypoint_table(self.root.join(&script.waypoints))?;
        let mut config = self.waypoint_config.clone();
        if let Some(distance) = script.wp_distance_ft {
            config.wp_distance_ft = distance;
        }

        self.script_ic = Some(script.initial.unwrap_or_else(|| {
            let start = rows[0];
            let heading_deg = rows
                .get(1)
                .map(|next| {
                    bearing_rad(
                        start.lat_deg.to_radians(),
                        start.lon_deg.to_radians(),
                        next.lat_deg.to_radians(),
                        next.lon_deg.to_radians(),
                    )
                    .to_degrees()
                })
                .unwrap_or(0.0);
            InitialConditions {
                latitude_deg: start.lat_deg,
                longitude_deg: start.lon_deg,
                altitude_ft: start.altitude_m * config.feet_per_meter,
                airspeed_fps: start.airspeed_mps * config.feet_per_meter,
                heading_deg,
            }
        }));

        self.events = plan_events(&rows, &config)?;
        self.fired = vec![false; self.events.len()];
        self.dt = script.dt;

        info!(
            "[FDM] Loaded script '{}' with {} waypoint events, dt {:.5}s, end {:.1}s",
            script.name,
            self.events.len(),
            script.dt,
            script.end_time
        );
        self.script = Some(script);
        Ok(())
    }

    fn run_ic(&mut self) -> Result<(), FdmError> {
        if self.script.is_none() {
            return Err(FdmError::NoScript);
        }
        if self.model.is_none() {
            return Err(FdmError::NoModel);
        }
        let ic = self.initial_conditions().ok_or(FdmError::NoScript)?;

        let lat = ic.latitude_deg.to_radians();
        let lon = ic.longitude_deg.to_radians();

        self.props = PropertyTree::new();
        self.props.set(LATITUDE, lat);
        self.props.set(LONGITUDE, lon);
        self.props.set(ALTITUDE, ic.altitude_ft);
        self.props.set(AIRSPEED, ic.airspeed_fps);
        self.props.set(HEADING, normalize_angle_rad(ic.heading_deg.to_radians()));
        self.props.set(TARGET_LAT, lat);
        self.props.set(TARGET_LON, lon);
        self.props.set(ALTITUDE_SETPOINT, ic.altitude_ft);
        self.props.set(AIRSPEED_SETPOINT, ic.airspeed_fps);
        self.props.set(ACTIVE_WAYPOINT, 0.0);
        self.props.set(SIM_TIME, 0.0);
        let distance = waypoint_distance(&self.props);
        self.props.set(WP_DISTANCE, distance);

        self.sim_time = 0.0;
        self.fired = vec![false; self.events.len()];
        self.transitions.clear();
        self.initialized = true;
        Ok(())
    }

    fn run(&mut self) -> Result<bool, FdmError> {
        if !self.initialized {
            return Err(FdmError::NotInitialized);
        }
        let end_time = self.script.as_ref().map(|s| s.end_time).ok_or(FdmError::NoScript)?;

        if self.holding {
            return Ok(true);
        }

        self.advance_transitions();
        let model = self.model.as_ref().ok_or(FdmError::NoModel)?;
        integrate(model, &mut self.props, self.dt);
        let distance = waypoint_distance(&self.props);
        self.props.set(WP_DISTANCE, distance);
        self.evaluate_events();

        self.sim_time += self.dt;
        self.props.set(SIM_TIME, self.sim_time);

        Ok(self.sim_time <= end_time)
    }

    fn delta_t(&self) -> f64 {
        self.dt
    }

    fn sim_time(&self) -> f64 {
        self.sim_time
    }

    fn hold(&mut self) {
        if !self.holding {
            debug!("[FDM] Holding at {:.2}s", self.sim_time);
        }
        self.holding = true;
    }

    fn resume(&mut self) {
        if self.holding {
            debug!("[FDM] Resuming at {:.2}s", self.sim_time);
        }
        self.holding = false;
    }

    fn holding(&self) -> bool {
        self.holding
    }

    fn enable_increment_then_hold(&mut self, steps: u32) {
        self.steps_until_hold = Some(steps);
        self.resume();
    }

    fn check_incremental_hold(&mut self) {
        match self.steps_until_hold {
            Some(0) => {
                self.hold();
                self.steps_until_hold = None;
            }
            Some(n) => self.steps_until_hold = Some(n - 1),
            None => {}
        }
    }

    fn configuration(&self) -> String {
        let mut lines = vec![format!("Root directory: {:?}", self.root)];

        match self.model {
            Some(ref m) => lines.push(format!(
                "Aircraft: {} (climb {} ft/min, descent {} ft/min, turn {} deg/s, accel {} ft/s^2, airspeed {}..{} ft/s)",
                m.name, m.climb_rate_fpm, m.descent_rate_fpm, m.turn_rate_dps,
                m.acceleration_fps2, m.min_airspeed_fps, m.max_airspeed_fps
            )),
            None => lines.push("Aircraft: none".to_string()),
        }

        match self.script {
            Some(ref s) => {
                lines.push(format!("Script: {} (end {:.1}s)", s.name, s.end_time));
                lines.push(format!("Waypoint table: {}", s.waypoints));
            }
            None => lines.push("Script: none".to_string()),
        }

        lines.push(format!("Frame duration: {:.6}s ({:.1} Hz)", self.dt, 1.0 / self.dt));
        lines.push(format!("Waypoint events: {}", self.events.len()));

        if let Some(ic) = self.initial_conditions() {
            lines.push(format!(
                "Start: {:.5} deg, {:.5} deg, {:.0} ft, {:.1} ft/s, heading {:.1} deg",
                ic.latitude_deg, ic.longitude_deg, ic.altitude_ft, ic.airspeed_fps, ic.heading_deg
            ));
        }

        lines.join("\n")
    }

    fn get_property(&self, name: &str) -> Option<f64> {
        self.props.get(name)
    }

    fn set_property(&mut self, name: &str, value: f64) {
        self.props.set(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> AircraftModel {
        serde_json::from_str(
            r#"{ "name": "test", "climb_rate_fpm": 600, "descent_rate_fpm": 600,
                 "turn_rate_dps": 3.0, "acceleration_fps2": 2.0,
                 "min_airspeed_fps": 100, "max_airspeed_fps": 500 }"#,
        )
        .unwrap()
    }

    fn level_flight() -> PropertyTree {
        let mut props = PropertyTree::new();
        props.set(LATITUDE, 0.0);
        props.set(LONGITUDE, 0.0);
        props.set(ALTITUDE, 1000.0);
        props.set(AIRSPEED, 200.0);
        props.set(HEADING, 0.0);
        props.set(TARGET_LAT, 0.01);
        props.set(TARGET_LON, 0.0);
        props.set(ALTITUDE_SETPOINT, 1000.0);
        props.set(AIRSPEED_SETPOINT, 200.0);
        props
    }

    #[test]
    fn test_integrate_straight_and_level() {
        let mut props = level_flight();
        integrate(&model(), &mut props, 1.0);

        let moved = props.value(LATITUDE) * EARTH_RADIUS_FT;
        assert!((moved - 200.0).abs() < 1e-6);
        assert_eq!(props.value(ALTITUDE), 1000.0);
        assert_eq!(props.value(AIRSPEED), 200.0);
    }

    #[test]
    fn test_integrate_respects_envelope() {
        let mut props = level_flight();
        props.set(ALTITUDE_SETPOINT, 1005.0);
        props.set(AIRSPEED_SETPOINT, 900.0);
        props.set(TARGET_LAT, 0.0);
        props.set(TARGET_LON, 0.01);

        integrate(&model(), &mut props, 1.0);

        // 10 ft/s climb capped at the setpoint
        assert_eq!(props.value(ALTITUDE), 1005.0);
        assert_eq!(props.value(AIRSPEED), 202.0);
        assert!((props.value(HEADING) - 3f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn test_incremental_hold() {
        let mut fdm = KinematicFdm::new("data");
        fdm.hold();
        fdm.enable_increment_then_hold(2);
        assert!(!fdm.holding());

        fdm.check_incremental_hold();
        fdm.check_incremental_hold();
        assert!(!fdm.holding());
        fdm.check_incremental_hold();
        assert!(fdm.holding());
    }

    #[test]
    fn test_run_before_ic_fails() {
        let mut fdm = KinematicFdm::new("data");
        assert!(matches!(fdm.run(), Err(FdmError::NotInitialized)));
        assert!(matches!(fdm.run_ic(), Err(FdmError::NoScript)));
    }
}
