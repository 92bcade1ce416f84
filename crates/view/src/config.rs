use foundation::math::LonLat;
use serde::{Deserialize, Serialize};

/// Default map center: the Owl Mountains foothills near Pieszyce.
pub const DEFAULT_CENTER: LonLat = LonLat::new(16.62, 50.69);
pub const DEFAULT_ZOOM: f64 = 12.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    pub fade_duration_ms: u64,
    /// Gap between the end of a fade into dark mode and the flight start.
    pub flight_delay_ms: u64,
    pub center_duration_ms: u64,
    pub fit_duration_ms: u64,
    pub fit_padding_px: f64,
    pub initial_center: LonLat,
    pub initial_zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub viewport_px: [f64; 2],
    pub start_dark: bool,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            fade_duration_ms: 700,
            flight_delay_ms: 150,
            center_duration_ms: 1_000,
            fit_duration_ms: 1_000,
            fit_padding_px: 40.0,
            initial_center: DEFAULT_CENTER,
            initial_zoom: DEFAULT_ZOOM,
            min_zoom: 0.0,
            max_zoom: 20.0,
            viewport_px: [1280.0, 800.0],
            start_dark: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub center: LonLat,
    pub base_zoom: f64,
    pub waypoint_count: usize,
    pub radius_min_deg: f64,
    pub radius_max_deg: f64,
    pub zoom_jitter: f64,
    pub duration_min_ms: u64,
    pub duration_max_ms: u64,
    pub pause_min_ms: u64,
    pub pause_max_ms: u64,
    /// RNG seed for deterministic plans. None = random.
    pub rng_seed: Option<u64>,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            base_zoom: DEFAULT_ZOOM,
            waypoint_count: 10,
            radius_min_deg: 0.03,
            radius_max_deg: 0.12,
            zoom_jitter: 1.0,
            duration_min_ms: 4_000,
            duration_max_ms: 7_000,
            pause_min_ms: 2_000,
            pause_max_ms: 3_000,
            rng_seed: None,
        }
    }
}
