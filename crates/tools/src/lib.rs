//! Command implementations behind the `wayfarer` binary. Everything here is
//! synchronous and clock-free so it can be tested directly.

use std::fs;
use std::path::Path;

use formats::{Feature, FeatureCollection, FeatureSource, select_feature};
use foundation::math::{LonLat, bearing, distance_meters, mercator};
use foundation::{Millis, Position};
use layers::vector::{Extent, StyledShape, shapes_from_feature};
use navigation::{
    EventFamily, HeadingSample, OrientationConfig, OrientationEvent, OrientationSource,
    OrientationTracker, PositionService, SimulatorConfig, TrackingConfig,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use session::AppConfig;
use view::{FlightConfig, generate_plan};

/// Reads an [`AppConfig`] from a JSON file, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, String> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let text = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    AppConfig::from_json_str(&text).map_err(|e| format!("{path:?}: {e}"))
}

/// Parses `lat,lon`.
pub fn parse_lat_lon(s: &str) -> Result<LonLat, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got {s:?}"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("latitude {lat:?}: {e}"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|e| format!("longitude {lon:?}: {e}"))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(format!("coordinate out of range: {lat},{lon}"));
    }
    Ok(LonLat::new(lon, lat))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegReport {
    pub bearing_deg: f64,
    pub distance_m: f64,
}

pub fn leg(from: LonLat, to: LonLat) -> LegReport {
    LegReport {
        bearing_deg: bearing(from, to),
        distance_m: distance_meters(from.lat, from.lon, to.lat, to.lon),
    }
}

/// Runs the position simulator under a virtual clock and returns the seed
/// plus `steps` perturbed positions.
pub fn simulate(cfg: &SimulatorConfig, seed: Option<Position>, steps: u32) -> Vec<Position> {
    let mut service = PositionService::new(TrackingConfig::default(), cfg.clone());
    let mut out = Vec::new();
    if !service.begin_simulation(seed, Millis::ZERO) {
        return out;
    }
    out.extend(service.current());
    for i in 1..=u64::from(steps) {
        service.tick(Millis(i * cfg.interval_ms.max(1)));
        out.extend(service.current());
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaypointReport {
    pub lat: f64,
    pub lon: f64,
    pub zoom: f64,
    pub duration_ms: u64,
}

pub fn flight_plan(cfg: &FlightConfig, seed: Option<u64>) -> Vec<WaypointReport> {
    let mut rng = match seed.or(cfg.rng_seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    generate_plan(cfg, &mut rng)
        .into_iter()
        .map(|w| {
            let at = mercator::to_lon_lat(w.center);
            WaypointReport {
                lat: at.lat,
                lon: at.lon,
                zoom: w.zoom,
                duration_ms: w.duration_ms,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayReport {
    pub geometry: &'static str,
    pub name: Option<String>,
    pub feature_count: usize,
    pub extent: Option<Extent>,
    pub shapes: Vec<StyledShape>,
}

/// Parses a GeoJSON payload and describes what would be drawn for it.
pub fn overlay(payload: &str, source: FeatureSource) -> Result<Option<OverlayReport>, String> {
    let collection = FeatureCollection::from_geojson_str(payload).map_err(|e| e.to_string())?;
    let feature_count = collection.len();
    Ok(select_feature(collection, source).map(|f| overlay_for(&f, feature_count)))
}

pub fn overlay_for(feature: &Feature, feature_count: usize) -> OverlayReport {
    let shapes = shapes_from_feature(feature);
    let mut layer = layers::vector::VectorLayer::new(0);
    layer.replace(shapes.clone());
    OverlayReport {
        geometry: feature.geometry.type_name(),
        name: feature
            .property_str("name")
            .or_else(|| feature.property_str("display_name"))
            .map(str::to_string),
        feature_count,
        extent: layer.extent(),
        shapes,
    }
}

struct NoListeners;

impl OrientationSource for NoListeners {
    fn add_listener(&mut self, _family: EventFamily) {}
    fn remove_listener(&mut self, _family: EventFamily) {}
}

/// Computes the heading sample a device at `at` would show for one
/// orientation reading.
pub fn heading(
    cfg: &OrientationConfig,
    at: LonLat,
    target: LonLat,
    event: OrientationEvent,
) -> Option<HeadingSample> {
    let mut tracker = OrientationTracker::new(cfg.clone());
    let mut source = NoListeners;
    tracker.start(Some(target), &mut source);
    let position = Position::new(at.lat, at.lon, 0.0);
    tracker.handle_event(&event, Some(&position))
}
