//! Spherical Web Mercator (EPSG:3857), the projection of the map view.

use super::{LonLat, Vec2, deg_to_rad, rad_to_deg};

/// Sphere radius used by EPSG:3857 (meters).
pub const MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// Half of the projected world width (meters).
pub const MERCATOR_HALF_SIZE: f64 = std::f64::consts::PI * MERCATOR_RADIUS_M;

/// Latitude beyond which Web Mercator is undefined in practice.
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Tile edge length in pixels for the default XYZ grid.
pub const TILE_SIZE_PX: f64 = 256.0;

/// Resolution (projection units per pixel) at zoom 0.
pub const MAX_RESOLUTION: f64 = 2.0 * MERCATOR_HALF_SIZE / TILE_SIZE_PX;

pub fn from_lon_lat(p: LonLat) -> Vec2 {
    let lat = p.lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT);
    let x = MERCATOR_RADIUS_M * deg_to_rad(p.lon);
    let y = MERCATOR_RADIUS_M * (std::f64::consts::FRAC_PI_4 + deg_to_rad(lat) / 2.0).tan().ln();
    Vec2::new(x, y)
}

pub fn to_lon_lat(p: Vec2) -> LonLat {
    let lon = rad_to_deg(p.x / MERCATOR_RADIUS_M);
    let lat = rad_to_deg(2.0 * (p.y / MERCATOR_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2);
    LonLat::new(lon, lat)
}

pub fn resolution_for_zoom(zoom: f64) -> f64 {
    MAX_RESOLUTION / 2f64.powf(zoom)
}

pub fn zoom_for_resolution(resolution: f64) -> f64 {
    (MAX_RESOLUTION / resolution).log2()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn origin_maps_to_origin() {
        let p = from_lon_lat(LonLat::new(0.0, 0.0));
        assert_close(p.x, 0.0, 1e-9);
        assert_close(p.y, 0.0, 1e-9);
    }

    #[test]
    fn antimeridian_is_half_world() {
        let p = from_lon_lat(LonLat::new(180.0, 0.0));
        assert_close(p.x, MERCATOR_HALF_SIZE, 1e-6);
    }

    #[test]
    fn inverse_recovers_coordinates() {
        let ll = LonLat::new(16.62, 50.69);
        let back = to_lon_lat(from_lon_lat(ll));
        assert_close(back.lon, ll.lon, 1e-9);
        assert_close(back.lat, ll.lat, 1e-9);
    }

    #[test]
    fn resolution_halves_per_zoom_level() {
        assert_close(resolution_for_zoom(0.0), 156_543.033_928_040_97, 1e-6);
        assert_close(resolution_for_zoom(1.0) * 2.0, resolution_for_zoom(0.0), 1e-9);
        assert_close(zoom_for_resolution(resolution_for_zoom(12.0)), 12.0, 1e-9);
    }
}
