use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the spherical model (meters).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Geographic coordinate in degrees, ordered `(lon, lat)` like GeoJSON.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<[f64; 2]> for LonLat {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

pub fn deg_to_rad(deg: f64) -> f64 {
    deg * std::f64::consts::PI / 180.0
}

pub fn rad_to_deg(rad: f64) -> f64 {
    rad * 180.0 / std::f64::consts::PI
}

/// Wraps any angle in degrees into `[0, 360)`.
pub fn normalize_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Initial great-circle bearing from `from` toward `to`, in degrees `[0, 360)`.
///
/// 0 is north, 90 is east. Identical points yield 0. NaN inputs propagate.
pub fn bearing(from: LonLat, to: LonLat) -> f64 {
    let lat1 = deg_to_rad(from.lat);
    let lat2 = deg_to_rad(to.lat);
    let d_lon = deg_to_rad(to.lon - from.lon);

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    (rad_to_deg(y.atan2(x)) + 360.0) % 360.0
}

/// Great-circle distance in meters (Haversine, spherical Earth).
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = deg_to_rad(lat1);
    let phi2 = deg_to_rad(lat2);
    let d_phi = deg_to_rad(lat2 - lat1);
    let d_lambda = deg_to_rad(lon2 - lon1);

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::{LonLat, bearing, distance_meters, normalize_degrees};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn bearing_to_self_is_zero() {
        let a = LonLat::new(16.62, 50.69);
        assert_eq!(bearing(a, a), 0.0);
    }

    #[test]
    fn bearing_cardinal_directions() {
        let origin = LonLat::new(0.0, 0.0);
        assert_close(bearing(origin, LonLat::new(0.0, 1.0)), 0.0, 1e-9);
        assert_close(bearing(origin, LonLat::new(1.0, 0.0)), 90.0, 1e-9);
        assert_close(bearing(origin, LonLat::new(0.0, -1.0)), 180.0, 1e-9);
        assert_close(bearing(origin, LonLat::new(-1.0, 0.0)), 270.0, 1e-9);
    }

    #[test]
    fn bearing_stays_in_range() {
        let points = [
            LonLat::new(16.62, 50.69),
            LonLat::new(-122.4, 37.8),
            LonLat::new(179.9, -45.0),
            LonLat::new(-179.9, 89.0),
            LonLat::new(0.0, -89.5),
        ];
        for a in points {
            for b in points {
                let brg = bearing(a, b);
                assert!((0.0..360.0).contains(&brg), "bearing {brg} out of range");
            }
        }
    }

    #[test]
    fn bearing_nan_propagates() {
        assert!(bearing(LonLat::new(f64::NAN, 0.0), LonLat::new(1.0, 1.0)).is_nan());
    }

    #[test]
    fn distance_is_symmetric() {
        let ab = distance_meters(50.69, 16.62, 52.23, 21.01);
        let ba = distance_meters(52.23, 21.01, 50.69, 16.62);
        assert!(((ab - ba) / ab).abs() <= 1e-6);
        assert!(ab > 0.0);
    }

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(distance_meters(50.69, 16.62, 50.69, 16.62), 0.0);
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = distance_meters(0.0, 0.0, 1.0, 0.0);
        assert_close(d, 111_194.93, 0.5);
    }

    #[test]
    fn normalize_wraps_negative_and_full_turns() {
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_close(normalize_degrees(-30.0), 330.0, 1e-12);
        assert_close(normalize_degrees(725.0), 5.0, 1e-12);
    }
}
