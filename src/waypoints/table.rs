use std::fs;
use std::path::Path;

use super::WaypointError;

pub const LAT_COLUMN: &str = "lat";
pub const LON_COLUMN: &str = "lon";
pub const ALTITUDE_COLUMN: &str = "altitude_m";
pub const AIRSPEED_COLUMN: &str = "air_speed_m_per_s";

/// One row of the flight data table, in the table's own units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaypointRow {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub altitude_m: f64,
    pub airspeed_mps: f64,
}

/// Waypoint in FDM units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub lat_rad: f64,
    pub lon_rad: f64,
    pub altitude_ft: f64,
    pub airspeed_fps: f64,
}

impl WaypointRow {
    pub fn to_waypoint(&self, feet_per_meter: f64) -> Waypoint {
        Waypoint {
            lat_rad: self.lat_deg.to_radians(),
            lon_rad: self.lon_deg.to_radians(),
            altitude_ft: self.altitude_m * feet_per_meter,
            airspeed_fps: self.airspeed_mps * feet_per_meter,
        }
    }
}

/// Split one CSV record. Commas inside double quotes stay in the cell and `""`
/// inside quotes is a literal quote.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                cell.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => cells.push(std::mem::take(&mut cell).trim().to_string()),
            _ => cell.push(c),
        }
    }
    cells.push(cell.trim().to_string());
    cells
}

/// Parse a CSV export of the flight data spreadsheet
pub fn parse_waypoint_table(content: &str) -> Result<Vec<WaypointRow>, WaypointError> {
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let (_, header) = lines.next().ok_or(WaypointError::Empty)?;
    let header = split_csv_line(header.trim_start_matches('\u{feff}'));

    let column = |name: &'static str| -> Result<usize, WaypointError> {
        header
            .iter()
            .position(|h| h == name)
            .ok_or(WaypointError::MissingColumn(name))
    };

    let lat_idx = column(LAT_COLUMN)?;
    let lon_idx = column(LON_COLUMN)?;
    let alt_idx = column(ALTITUDE_COLUMN)?;
    let spd_idx = column(AIRSPEED_COLUMN)?;

    let mut rows = Vec::new();
    for (line_no, line) in lines {
        let cells = split_csv_line(line);
        let cell = |idx: usize, name: &'static str| -> Result<f64, WaypointError> {
            let raw = cells.get(idx).map(String::as_str).unwrap_or("");
            raw.parse::<f64>().map_err(|_| WaypointError::InvalidValue {
                line: line_no + 1,
                column: name,
                value: raw.to_string(),
            })
        };

        rows.push(WaypointRow {
            lat_deg: cell(lat_idx, LAT_COLUMN)?,
            lon_deg: cell(lon_idx, LON_COLUMN)?,
            altitude_m: cell(alt_idx, ALTITUDE_COLUMN)?,
            airspeed_mps: cell(spd_idx, AIRSPEED_COLUMN)?,
        });
    }

    if rows.is_empty() {
        return Err(WaypointError::Empty);
    }

    Ok(rows)
}

/// Load the flight data table from file
pub fn load_waypoint_table<P: AsRef<Path>>(path: P) -> Result<Vec<WaypointRow>, WaypointError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| WaypointError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_waypoint_table(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_extra_columns() {
        let csv = "time,lat,lon,altitude_m,heading,air_speed_m_per_s\n\
                   0,40.08,116.58,10,0,80\n\
                   \n\
                   60,\"40.10\",116.60,300,12,120.5\n";
        let rows = parse_waypoint_table(csv).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].lat_deg, 40.10);
        assert_eq!(rows[1].airspeed_mps, 120.5);
    }

    #[test]
    fn test_quoted_cells_with_commas() {
        let csv = "name,lat,lon,altitude_m,air_speed_m_per_s\n\
                   \"Beijing, Capital\",40.08,116.58,10,80\n\
                   \"Xi'an \"\"Xianyang\"\"\", 34.44 ,108.75,400,\"1,5\"\n";
        let cells = split_csv_line("\"a, b\",\"say \"\"hi\"\"\",3");
        assert_eq!(cells, vec!["a, b", "say \"hi\"", "3"]);

        match parse_waypoint_table(csv).unwrap_err() {
            WaypointError::InvalidValue { line, column, value } => {
                assert_eq!(line, 3);
                assert_eq!(column, AIRSPEED_COLUMN);
                assert_eq!(value, "1,5");
            }
            other => panic!("unexpected error: {}", other),
        }

        let rows = parse_waypoint_table(&csv.replace("\"1,5\"", "150")).unwrap();
        assert_eq!(rows[0].lon_deg, 116.58);
        assert_eq!(rows[1].lat_deg, 34.44);
        assert_eq!(rows[1].airspeed_mps, 150.0);
    }

    #[test]
    fn test_missing_column() {
        let err = parse_waypoint_table("lat,lon,altitude_m\n1,2,3\n").unwrap_err();
        assert!(matches!(err, WaypointError::MissingColumn(AIRSPEED_COLUMN)));
    }

    #[test]
    fn test_invalid_value_reports_line() {
        let csv = "lat,lon,altitude_m,air_speed_m_per_s\n1,2,3,4\n1,x,3,4\n";
        match parse_waypoint_table(csv).unwrap_err() {
            WaypointError::InvalidValue { line, column, value } => {
                assert_eq!(line, 3);
                assert_eq!(column, LON_COLUMN);
                assert_eq!(value, "x");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_header_only_is_empty() {
        let err = parse_waypoint_table("lat,lon,altitude_m,air_speed_m_per_s\n").unwrap_err();
        assert!(matches!(err, WaypointError::Empty));
    }

    #[test]
    fn test_unit_conversion() {
        let row = WaypointRow { lat_deg: 180.0, lon_deg: 90.0, altitude_m: 1000.0, airspeed_mps: 100.0 };
        let wp = row.to_waypoint(3.28084);

        assert!((wp.lat_rad - std::f64::consts::PI).abs() < 1e-12);
        assert!((wp.altitude_ft - 3280.84).abs() < 1e-9);
        assert!((wp.airspeed_fps - 328.084).abs() < 1e-9);
    }
}
