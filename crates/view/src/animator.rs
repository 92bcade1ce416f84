use formats::{Feature, FeatureCollection, FeatureSource, select_feature};
use foundation::math::{LonLat, Vec2, mercator};
use foundation::{Millis, Position};
use layers::position::PositionLayer;
use layers::raster::{DARK_FILTER, RasterLayer, TileSource};
use layers::vector::{VectorLayer, shapes_from_feature};
use runtime::{Metrics, earliest};
use serde::Serialize;

use crate::config::{AnimatorConfig, FlightConfig};
use crate::fade::{CrossFade, LayerOpacities};
use crate::flight::{Flight, FlightState};
use crate::view::{CameraAnimation, MapView};

pub const NORMAL_LAYER_ID: u64 = 1;
pub const DARK_LAYER_ID: u64 = 2;
pub const OVERLAY_LAYER_ID: u64 = 3;
pub const POSITION_LAYER_ID: u64 = 4;

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub enum ModeState {
    Steady { dark: bool },
    Transitioning { fade: CrossFade },
}

/// Result of [`ViewAnimator::set_mode`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum ModeChange {
    /// Already in the requested mode; only the flight was adjusted.
    Unchanged,
    Started,
    /// A cross-fade is still running; the request was rejected.
    Busy,
}

/// Sole writer of the map view and tile layer opacities.
#[derive(Debug)]
pub struct ViewAnimator {
    config: AnimatorConfig,
    view: MapView,
    normal: RasterLayer,
    dark: RasterLayer,
    overlay: VectorLayer,
    position: PositionLayer,
    mode: ModeState,
    flight: Flight,
    camera: Option<CameraAnimation>,
    metrics: Metrics,
    flight_legs_seen: u64,
}

impl ViewAnimator {
    pub fn new(config: AnimatorConfig, flight: FlightConfig) -> Self {
        let view = MapView::new(config.initial_center, config.initial_zoom, config.viewport_px)
            .with_zoom_range(config.min_zoom, config.max_zoom);
        let opacities = LayerOpacities::steady(config.start_dark);
        let normal = RasterLayer::new(NORMAL_LAYER_ID, TileSource::osm()).with_opacity(opacities.normal);
        let dark = RasterLayer::new(DARK_LAYER_ID, TileSource::osm())
            .with_filter(DARK_FILTER)
            .with_opacity(opacities.dark);
        Self {
            mode: ModeState::Steady {
                dark: config.start_dark,
            },
            config,
            view,
            normal,
            dark,
            overlay: VectorLayer::new(OVERLAY_LAYER_ID),
            position: PositionLayer::new(POSITION_LAYER_ID),
            flight: Flight::new(flight),
            camera: None,
            metrics: Metrics::new(),
            flight_legs_seen: 0,
        }
    }

    pub fn view(&self) -> &MapView {
        &self.view
    }

    pub fn mode(&self) -> ModeState {
        self.mode
    }

    pub fn is_dark(&self) -> bool {
        match self.mode {
            ModeState::Steady { dark } => dark,
            ModeState::Transitioning { fade } => fade.to_dark,
        }
    }

    pub fn flight_state(&self) -> FlightState {
        self.flight.state()
    }

    pub fn opacities(&self) -> LayerOpacities {
        LayerOpacities {
            normal: self.normal.opacity(),
            dark: self.dark.opacity(),
        }
    }

    pub fn normal_layer(&self) -> &RasterLayer {
        &self.normal
    }

    pub fn dark_layer(&self) -> &RasterLayer {
        &self.dark
    }

    pub fn overlay(&self) -> &VectorLayer {
        &self.overlay
    }

    pub fn position_layer(&self) -> &PositionLayer {
        &self.position
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn set_viewport(&mut self, width_px: f64, height_px: f64) {
        self.view.set_viewport(width_px, height_px);
    }

    /// Switches between the light and dark map.
    ///
    /// Requesting the current mode only starts (dark) or stops (light) the
    /// flight. Requests during a running cross-fade are rejected.
    pub fn set_mode(&mut self, dark: bool, now: Millis) -> ModeChange {
        match self.mode {
            ModeState::Transitioning { .. } => {
                self.metrics.increment("view.mode_rejected");
                tracing::debug!(dark, "mode change rejected during transition");
                ModeChange::Busy
            }
            ModeState::Steady { dark: current } if current == dark => {
                if dark {
                    self.start_flight(now);
                } else {
                    self.stop_flight();
                }
                ModeChange::Unchanged
            }
            ModeState::Steady { .. } => {
                if !dark {
                    self.stop_flight();
                }
                self.mode = ModeState::Transitioning {
                    fade: CrossFade::new(dark, now, self.config.fade_duration_ms),
                };
                tracing::info!(dark, "map mode transition started");
                ModeChange::Started
            }
        }
    }

    /// Starts the ambient flight now. No-op while one is active.
    pub fn start_flight(&mut self, now: Millis) -> bool {
        if self.flight.is_active() {
            return false;
        }
        self.camera = None;
        self.flight.start(now, &self.view)
    }

    pub fn stop_flight(&mut self) -> bool {
        self.flight.stop()
    }

    /// True while a fade or camera move needs per-frame ticks.
    pub fn is_animating(&self) -> bool {
        matches!(self.mode, ModeState::Transitioning { .. })
            || self.camera.is_some()
            || self.flight.is_moving()
    }

    /// Next timer deadline (flight delay or pause). Frame-driven work is
    /// reported by [`ViewAnimator::is_animating`] instead.
    pub fn poll_at(&self) -> Option<Millis> {
        earliest([self.flight.next_deadline()])
    }

    /// Advances every running animation to `now`. Returns whether anything
    /// visible changed.
    pub fn tick(&mut self, now: Millis) -> bool {
        let mut changed = false;

        if let ModeState::Transitioning { fade } = self.mode {
            let o = fade.opacities(now);
            self.normal.set_opacity(o.normal);
            self.dark.set_opacity(o.dark);
            self.metrics.increment("view.fade_frames");
            changed = true;
            if fade.is_complete(now) {
                self.mode = ModeState::Steady { dark: fade.to_dark };
                tracing::info!(dark = fade.to_dark, "map mode transition finished");
                if fade.to_dark {
                    self.flight
                        .schedule(fade.span.end().after(self.config.flight_delay_ms));
                }
            }
        }

        if let Some(anim) = self.camera {
            if anim.apply(now, &mut self.view) {
                self.camera = None;
            }
            changed = true;
        }

        changed |= self.flight.tick(now, &mut self.view);
        let legs = self.flight.legs_started();
        if legs > self.flight_legs_seen {
            self.metrics
                .add("view.flight_steps", legs - self.flight_legs_seen);
            self.flight_legs_seen = legs;
        }

        changed
    }

    /// Replaces the overlay with one feature.
    pub fn show_feature(&mut self, feature: &Feature) {
        self.overlay.replace(shapes_from_feature(feature));
        tracing::info!(
            geometry = feature.geometry.type_name(),
            shapes = self.overlay.shapes().len(),
            "overlay replaced"
        );
    }

    /// Parses a GeoJSON payload, picks a feature and shows it. Returns the
    /// chosen feature; bad payloads leave the overlay untouched and yield `None`.
    pub fn show_geometry(&mut self, payload: &str, source: FeatureSource) -> Option<Feature> {
        let collection = match FeatureCollection::from_geojson_str(payload) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, ?source, "overlay payload rejected");
                return None;
            }
        };
        let Some(feature) = select_feature(collection, source) else {
            tracing::warn!(?source, "overlay payload has no usable feature");
            return None;
        };
        self.show_feature(&feature);
        Some(feature)
    }

    pub fn clear_overlay(&mut self) {
        self.overlay.clear();
    }

    /// Animates the view to frame the overlay. Returns false when it is empty.
    pub fn fit_overlay(&mut self, now: Millis) -> bool {
        let Some(extent) = self.overlay.extent() else {
            return false;
        };
        let pad = self.config.fit_padding_px * 2.0;
        let [vw, vh] = self.view.viewport_px;
        let avail_w = (vw - pad).max(1.0);
        let avail_h = (vh - pad).max(1.0);
        let resolution = (extent.width() / avail_w).max(extent.height() / avail_h);
        let zoom = if resolution > 0.0 {
            mercator::zoom_for_resolution(resolution)
        } else {
            self.view.max_zoom
        };
        self.flight.stop();
        self.camera = Some(CameraAnimation::new(
            &self.view,
            extent.center(),
            zoom,
            now,
            self.config.fit_duration_ms,
        ));
        true
    }

    pub fn show_position(&mut self, position: &Position) {
        self.position.update(position);
    }

    pub fn clear_position(&mut self) {
        self.position.clear();
    }

    /// Animates to `(lat, lon)` and optionally `zoom`.
    ///
    /// A positive `offset_px` leaves the target that many pixels right of the
    /// viewport center, making room for a panel on the left. Any running
    /// flight is stopped.
    pub fn center_on(&mut self, lat: f64, lon: f64, zoom: Option<f64>, offset_px: f64, now: Millis) {
        self.flight.stop();
        let target = mercator::from_lon_lat(LonLat::new(lon, lat));
        let center = Vec2::new(target.x - offset_px * self.view.resolution(), target.y);
        let zoom = zoom.unwrap_or(self.view.zoom);
        self.camera = Some(CameraAnimation::new(
            &self.view,
            center,
            zoom,
            now,
            self.config.center_duration_ms,
        ));
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            center: self.view.center_lon_lat(),
            zoom: self.view.zoom,
            dark: self.is_dark(),
            transitioning: matches!(self.mode, ModeState::Transitioning { .. }),
            flying: self.flight.is_active(),
            normal_opacity: self.normal.opacity(),
            dark_opacity: self.dark.opacity(),
            dark_filter: self.dark.filter.clone(),
            tile_url: self.normal.source.url_template.clone(),
            overlay: self.overlay.clone(),
            position: self.position.clone(),
        }
    }
}

/// Render-facing state handed to hosts each frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSnapshot {
    pub center: LonLat,
    pub zoom: f64,
    pub dark: bool,
    pub transitioning: bool,
    pub flying: bool,
    pub normal_opacity: f64,
    pub dark_opacity: f64,
    pub dark_filter: Option<String>,
    pub tile_url: String,
    pub overlay: VectorLayer,
    pub position: PositionLayer,
}

#[cfg(test)]
mod tests {
    use super::{ModeChange, ModeState, ViewAnimator};
    use crate::config::{AnimatorConfig, FlightConfig};
    use crate::fade::LayerOpacities;
    use crate::flight::FlightState;
    use formats::FeatureSource;
    use foundation::math::{LonLat, mercator};
    use foundation::{Millis, Position};
    use pretty_assertions::assert_eq;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn animator() -> ViewAnimator {
        ViewAnimator::new(
            AnimatorConfig::default(),
            FlightConfig {
                rng_seed: Some(5),
                ..FlightConfig::default()
            },
        )
    }

    fn run_frames(a: &mut ViewAnimator, from: u64, to: u64) {
        let mut t = from;
        while t <= to {
            a.tick(Millis(t));
            t += 16;
        }
        a.tick(Millis(to));
    }

    #[test]
    fn fade_to_dark_snaps_and_schedules_flight() {
        let mut a = animator();
        assert_eq!(a.set_mode(true, Millis(0)), ModeChange::Started);
        a.tick(Millis(350));
        assert_eq!(a.opacities().dark, 0.5);
        a.tick(Millis(700));
        assert_eq!(a.opacities(), LayerOpacities::steady(true));
        assert_eq!(a.mode(), ModeState::Steady { dark: true });
        assert_eq!(a.flight_state(), FlightState::Scheduled { at: Millis(850) });
        assert_eq!(a.poll_at(), Some(Millis(850)));

        a.tick(Millis(850));
        assert!(matches!(a.flight_state(), FlightState::Moving { index: 0, .. }));
        assert_eq!(a.metrics().counter("view.flight_steps"), 1);
    }

    #[test]
    fn same_mode_twice_produces_no_frames() {
        let mut a = animator();
        assert_eq!(a.set_mode(false, Millis(0)), ModeChange::Unchanged);
        assert_eq!(a.set_mode(false, Millis(5)), ModeChange::Unchanged);
        a.tick(Millis(10));
        assert_eq!(a.metrics().counter("view.fade_frames"), 0);
        assert_eq!(a.opacities(), LayerOpacities::steady(false));
    }

    #[test]
    fn same_dark_mode_only_toggles_flight() {
        let mut a = animator();
        a.set_mode(true, Millis(0));
        run_frames(&mut a, 0, 700);
        let frames = a.metrics().counter("view.fade_frames");
        a.stop_flight();
        assert_eq!(a.set_mode(true, Millis(800)), ModeChange::Unchanged);
        assert!(matches!(a.flight_state(), FlightState::Moving { .. }));
        assert_eq!(a.metrics().counter("view.fade_frames"), frames);
    }

    #[test]
    fn mid_transition_requests_are_rejected() {
        let mut a = animator();
        a.set_mode(true, Millis(0));
        a.tick(Millis(100));
        assert_eq!(a.set_mode(false, Millis(200)), ModeChange::Busy);
        assert_eq!(a.metrics().counter("view.mode_rejected"), 1);
        a.tick(Millis(700));
        assert!(a.is_dark());
    }

    #[test]
    fn going_light_stops_flight_at_fade_start() {
        let mut a = animator();
        a.set_mode(true, Millis(0));
        run_frames(&mut a, 0, 900);
        assert!(a.snapshot().flying);
        assert_eq!(a.set_mode(false, Millis(1_000)), ModeChange::Started);
        assert_eq!(a.flight_state(), FlightState::Stopped);
        a.tick(Millis(1_700));
        assert_eq!(a.opacities(), LayerOpacities::steady(false));
        assert_eq!(a.flight_state(), FlightState::Stopped);
    }

    #[test]
    fn start_flight_is_idempotent() {
        let mut a = animator();
        assert!(a.start_flight(Millis(0)));
        assert!(!a.start_flight(Millis(1)));
        a.tick(Millis(2));
        assert_eq!(a.metrics().counter("view.flight_steps"), 1);
    }

    #[test]
    fn center_on_applies_offset_and_stops_flight() {
        let mut a = animator();
        a.start_flight(Millis(0));
        let res = a.view().resolution();
        a.center_on(50.70, 16.63, Some(15.0), 200.0, Millis(100));
        assert_eq!(a.flight_state(), FlightState::Stopped);
        a.tick(Millis(1_100));
        let target = mercator::from_lon_lat(LonLat::new(16.63, 50.70));
        assert_close(a.view().center.x, target.x - 200.0 * res, 1e-6);
        assert_close(a.view().center.y, target.y, 1e-6);
        assert_eq!(a.view().zoom, 15.0);
        assert!(!a.is_animating());
    }

    #[test]
    fn center_on_keeps_zoom_when_omitted() {
        let mut a = animator();
        a.center_on(50.0, 20.0, None, 0.0, Millis(0));
        a.tick(Millis(1_000));
        assert_eq!(a.view().zoom, 12.0);
        let c = a.view().center_lon_lat();
        assert_close(c.lat, 50.0, 1e-9);
        assert_close(c.lon, 20.0, 1e-9);
    }

    #[test]
    fn overlay_replacement_and_fit() {
        let mut a = animator();
        let square = r#"{"type":"Feature","properties":{},"geometry":{"type":"Polygon",
            "coordinates":[[[16.5,50.6],[16.7,50.6],[16.7,50.8],[16.5,50.6]]]}}"#;
        assert!(a.show_geometry(square, FeatureSource::Local).is_some());
        assert_eq!(a.overlay().shapes().len(), 1);

        assert!(a.show_geometry("not json", FeatureSource::Local).is_none());
        assert_eq!(a.overlay().shapes().len(), 1);

        assert!(a.fit_overlay(Millis(0)));
        a.tick(Millis(1_000));
        let c = a.view().center_lon_lat();
        assert!(c.lon > 16.5 && c.lon < 16.7);
        assert!(a.view().zoom > 9.0 && a.view().zoom < 13.0);

        a.clear_overlay();
        assert!(!a.fit_overlay(Millis(2_000)));
    }

    #[test]
    fn position_marker_follows_updates() {
        let mut a = animator();
        a.show_position(&Position::new(50.69, 16.62, 12.0));
        assert!(a.snapshot().position.is_shown());
        a.clear_position();
        assert!(!a.snapshot().position.is_shown());
    }
}
