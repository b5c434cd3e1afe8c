use std::fmt;

use crate::config::WaypointConfig;
use super::table::{Waypoint, WaypointRow};
use super::xml::{format_float, XmlElement};
use super::WaypointError;

pub const WP_DISTANCE: &str = "guidance/wp-distance";
pub const TARGET_LAT: &str = "guidance/target_wp_latitude_rad";
pub const TARGET_LON: &str = "guidance/target_wp_longitude_rad";
pub const ACTIVE_WAYPOINT: &str = "ap/active-waypoint";
pub const ALTITUDE_SETPOINT: &str = "ap/altitude_setpoint";
pub const AIRSPEED_SETPOINT: &str = "ap/airspeed_setpoint";
pub const NOTIFY_TRIGGER: &str = "simulation/notify-trigger";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl Comparison {
    pub fn holds(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Lt => lhs < rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Eq => lhs == rhs,
            Comparison::Ne => lhs != rhs,
            Comparison::Ge => lhs >= rhs,
            Comparison::Gt => lhs > rhs,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Comparison::Lt => "lt",
            Comparison::Le => "le",
            Comparison::Eq => "eq",
            Comparison::Ne => "ne",
            Comparison::Ge => "ge",
            Comparison::Gt => "gt",
        };
        write!(f, "{}", s)
    }
}

/// Right-hand side of a condition, kept as typed so the text renders like the table value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Int(i64),
    Float(f64),
}

impl Operand {
    pub fn value(&self) -> f64 {
        match *self {
            Operand::Int(v) => v as f64,
            Operand::Float(v) => v,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Operand::Int(v) => write!(f, "{}", v),
            Operand::Float(v) => write!(f, "{}", format_float(v)),
        }
    }
}

/// `property op value`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub property: String,
    pub comparison: Comparison,
    pub operand: Operand,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.property, self.comparison, self.operand)
    }
}

/// How a set action moves the property to its new value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetAction {
    Step,
    Exp { tc: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Set {
    pub property: String,
    pub value: Operand,
    pub value_type: bool, // emits type="value"
    pub action: SetAction,
}

impl Set {
    fn step(property: &str, value: Operand) -> Self {
        Self {
            property: property.to_string(),
            value,
            value_type: false,
            action: SetAction::Step,
        }
    }

    fn to_xml(&self) -> XmlElement {
        let mut el = XmlElement::new("set").attr("name", self.property.as_str());
        if self.value_type {
            el = el.attr("type", "value");
        }
        if let SetAction::Exp { tc } = self.action {
            el = el.attr("tc", format_float(tc)).attr("action", "FG_EXP");
        }
        el.attr("value", self.value.to_string())
    }
}

/// Property printed when an event fires
#[derive(Debug, Clone, PartialEq)]
pub struct Notify {
    pub caption: String,
    pub property: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaypointEvent {
    pub name: String,
    pub description: String,
    pub conditions: Vec<Condition>,
    pub sets: Vec<Set>,
    pub notify: Option<Notify>,
}

impl WaypointEvent {
    pub fn to_xml(&self) -> XmlElement {
        let mut condition = XmlElement::new("condition").attr("logic", "AND");
        for c in &self.conditions {
            condition = condition.text(c.to_string());
        }

        let mut event = XmlElement::new("event")
            .attr("name", self.name.as_str())
            .child(XmlElement::new("description").text(self.description.as_str()))
            .child(condition);

        for set in &self.sets {
            event = event.child(set.to_xml());
        }

        if let Some(ref notify) = self.notify {
            event = event.child(
                XmlElement::new("notify").child(
                    XmlElement::new("property")
                        .attr("caption", notify.caption.as_str())
                        .text(notify.property.as_str()),
                ),
            );
        }

        event
    }
}

/// Event that switches guidance from waypoint `index - 1` to `index`
pub fn waypoint_event(index: usize, wp: &Waypoint, config: &WaypointConfig) -> WaypointEvent {
    let previous = index as i64 - 1;
    let next = index as i64;
    let distance = config.wp_distance_ft;

    WaypointEvent {
        name: format!("Set Waypoint Num: {}", next),
        description: format!(
            "When the distance to waypoint {} is less than {} feet, then set the {} waypoint.",
            previous, distance, next
        ),
        conditions: vec![
            Condition {
                property: WP_DISTANCE.to_string(),
                comparison: Comparison::Lt,
                operand: Operand::Int(distance as i64),
            },
            Condition {
                property: ACTIVE_WAYPOINT.to_string(),
                comparison: Comparison::Eq,
                operand: Operand::Int(previous),
            },
        ],
        sets: vec![
            Set::step(TARGET_LAT, Operand::Float(wp.lat_rad)),
            Set::step(TARGET_LON, Operand::Float(wp.lon_rad)),
            Set::step(ACTIVE_WAYPOINT, Operand::Int(next)),
            Set::step(NOTIFY_TRIGGER, Operand::Int(1)),
            Set {
                value_type: true,
                ..Set::step(ALTITUDE_SETPOINT, Operand::Float(wp.altitude_ft))
            },
            Set {
                action: SetAction::Exp { tc: config.airspeed_tc },
                ..Set::step(AIRSPEED_SETPOINT, Operand::Float(wp.airspeed_fps))
            },
        ],
        notify: Some(Notify {
            caption: config.notify_caption.clone(),
            property: WP_DISTANCE.to_string(),
        }),
    }
}

/// Build the waypoint events for a table.
///
/// The first row is the starting location and produces no event. Events come out
/// last waypoint first, so one frame never cascades through several transitions.
pub fn plan_events(rows: &[WaypointRow], config: &WaypointConfig) -> Result<Vec<WaypointEvent>, WaypointError> {
    if rows.is_empty() {
        return Err(WaypointError::Empty);
    }

    let mut events: Vec<WaypointEvent> = rows[1..]
        .iter()
        .enumerate()
        .map(|(idx, row)| waypoint_event(idx + 1, &row.to_waypoint(config.feet_per_meter), config))
        .collect();
    events.reverse();

    Ok(events)
}

/// `<waypoints>` document holding the events
pub fn events_document(events: &[WaypointEvent]) -> XmlElement {
    events
        .iter()
        .fold(XmlElement::new("waypoints"), |root, e| root.child(e.to_xml()))
}
