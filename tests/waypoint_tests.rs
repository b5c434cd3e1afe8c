use anyhow::Result;
use fdm_runner::cli::cmd_waypoints;
use fdm_runner::config::WaypointConfig;
use fdm_runner::waypoints::{self, xml::format_float, WaypointError, WaypointRow};

fn row(lat_deg: f64, lon_deg: f64, altitude_m: f64, airspeed_mps: f64) -> WaypointRow {
    WaypointRow { lat_deg, lon_deg, altitude_m, airspeed_mps }
}

#[test]
fn test_document_layout() -> Result<()> {
    let config = WaypointConfig {
        feet_per_meter: 2.0,
        ..WaypointConfig::default()
    };
    let xml = waypoints::render_events(&[row(0.0, 0.0, 0.0, 0.0), row(45.0, 90.0, 100.0, 10.0)], &config)?;

    let expected = format!(
        "<?xml version=\"1.0\" ?>\n\
         <waypoints>\n\
         \t<event name=\"Set Waypoint Num: 1\">\n\
         \t\t<description>When the distance to waypoint 0 is less than 700 feet, then set the 1 waypoint.</description>\n\
         \t\t<condition logic=\"AND\">\n\
         \t\t\tguidance/wp-distance lt 700\n\
         \t\t\tap/active-waypoint eq 0\n\
         \t\t</condition>\n\
         \t\t<set name=\"guidance/target_wp_latitude_rad\" value=\"{}\"/>\n\
         \t\t<set name=\"guidance/target_wp_longitude_rad\" value=\"{}\"/>\n\
         \t\t<set name=\"ap/active-waypoint\" value=\"1\"/>\n\
         \t\t<set name=\"simulation/notify-trigger\" value=\"1\"/>\n\
         \t\t<set name=\"ap/altitude_setpoint\" type=\"value\" value=\"200.0\"/>\n\
         \t\t<set name=\"ap/airspeed_setpoint\" tc=\"1.0\" action=\"FG_EXP\" value=\"20.0\"/>\n\
         \t\t<notify>\n\
         \t\t\t<property caption=\"Distance to WP  \">guidance/wp-distance</property>\n\
         \t\t</notify>\n\
         \t</event>\n\
         </waypoints>\n",
        format_float(45f64.to_radians()),
        format_float(90f64.to_radians()),
    );

    assert_eq!(xml, expected);
    Ok(())
}

#[test]
fn test_last_waypoint_comes_first() -> Result<()> {
    let rows = vec![
        row(40.0, 116.0, 300.0, 100.0),
        row(40.1, 116.0, 400.0, 100.0),
        row(40.2, 116.0, 500.0, 100.0),
        row(40.3, 116.0, 600.0, 100.0),
    ];
    let xml = waypoints::render_events(&rows, &WaypointConfig::default())?;

    let third = xml.find("Set Waypoint Num: 3").expect("event 3 present");
    let first = xml.find("Set Waypoint Num: 1").expect("event 1 present");
    assert!(third < first);
    assert!(xml.contains("ap/active-waypoint eq 2"));
    assert!(!xml.contains("Set Waypoint Num: 4"));
    Ok(())
}

#[test]
fn test_custom_distance() -> Result<()> {
    let config = WaypointConfig {
        wp_distance_ft: 1200,
        ..WaypointConfig::default()
    };
    let xml = waypoints::render_events(&[row(0.0, 0.0, 0.0, 0.0), row(1.0, 1.0, 0.0, 0.0)], &config)?;

    assert!(xml.contains("guidance/wp-distance lt 1200"));
    assert!(xml.contains("is less than 1200 feet"));
    Ok(())
}

#[test]
fn test_single_row_gives_empty_document() -> Result<()> {
    let xml = waypoints::render_events(&[row(0.0, 0.0, 0.0, 0.0)], &WaypointConfig::default())?;
    assert_eq!(xml, "<?xml version=\"1.0\" ?>\n<waypoints/>\n");
    Ok(())
}

#[test]
fn test_convert_sample_table() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("waypoints.xml");

    let xml = cmd_waypoints(
        std::path::Path::new("data/flight_data_B787.csv"),
        &output,
        &WaypointConfig::default(),
        false,
    )?;

    assert_eq!(xml.matches("<event ").count(), 7);
    assert_eq!(std::fs::read_to_string(&output)?, xml);
    Ok(())
}

#[test]
fn test_missing_table() {
    let err = waypoints::convert_table("data/no_such_table.csv", &WaypointConfig::default()).unwrap_err();
    assert!(matches!(err, WaypointError::Io { .. }));
}
