/// Navigation utilities and calculations
use std::f64::consts::{PI, TAU};

const EARTH_RADIUS_KM: f64 = 6372.8;

/// Mean earth radius used by the FDM, in feet
pub const EARTH_RADIUS_FT: f64 = 20_925_646.325;

pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    EARTH_RADIUS_KM * haversine_rad(lat1.to_radians(), lon1.to_radians(), lat2.to_radians(), lon2.to_radians())
}

pub fn haversine_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine(lat1, lon1, lat2, lon2) / 1.852
}

/// Central angle between two points given in radians
pub fn haversine_rad(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * a.sqrt().min(1.0).asin()
}

/// Initial great-circle bearing in radians, 0..2π
pub fn bearing_rad(from_lat: f64, from_lon: f64, to_lat: f64, to_lon: f64) -> f64 {
    let dlon = to_lon - from_lon;
    let y = dlon.sin() * to_lat.cos();
    let x = from_lat.cos() * to_lat.sin() - from_lat.sin() * to_lat.cos() * dlon.cos();

    normalize_angle_rad(y.atan2(x))
}

/// Point reached after travelling `angular_distance` along `bearing`
pub fn destination_rad(lat: f64, lon: f64, bearing: f64, angular_distance: f64) -> (f64, f64) {
    let dest_lat = (lat.sin() * angular_distance.cos()
        + lat.cos() * angular_distance.sin() * bearing.cos())
    .asin();

    let dest_lon = lon
        + (bearing.sin() * angular_distance.sin() * lat.cos())
            .atan2(angular_distance.cos() - lat.sin() * dest_lat.sin());

    (dest_lat, dest_lon)
}

/// Normalize angle to 0..2π
pub fn normalize_angle_rad(angle: f64) -> f64 {
    angle.rem_euclid(TAU)
}

/// Signed heading error in radians, positive for a right turn, within -π..π
pub fn shortest_turn(current: f64, target: f64) -> f64 {
    let diff = normalize_angle_rad(target - current);
    if diff > PI {
        diff - TAU
    } else {
        diff
    }
}
